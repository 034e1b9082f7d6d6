use eventhub::{
    auth::AuthService,
    config::Settings,
    domain::*,
    repository::{
        EventRepository, SqliteEventRepository,
        SqliteUserRepository, UserRepository,
    },
};
use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::{address::en::CityName, company::en::CompanyName, lorem::en::Sentence, name::en::Name},
    Fake,
};
use rand::{seq::SliceRandom, Rng};
use sqlx::sqlite::SqlitePoolOptions;

const MAJORS: &[&str] = &["Computer Science", "Electrical Engineering", "Mechanical Engineering", "Design"];
const DEMO_PASSWORD: &str = "password123";

/// Provision the admin account and, optionally, demo data.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Database URL; falls back to the configured one
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "EVENTHUB_ADMIN_USERNAME", default_value = "admin")]
    admin_username: String,

    #[arg(long, env = "EVENTHUB_ADMIN_EMAIL", default_value = "admin@eventhub.local")]
    admin_email: String,

    #[arg(long, env = "EVENTHUB_ADMIN_PASSWORD")]
    admin_password: String,

    /// Also create demo institutes, students and events
    #[arg(long)]
    demo: bool,

    #[arg(long, default_value_t = 3)]
    institutes: usize,

    #[arg(long, default_value_t = 12)]
    students: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let settings = Settings::new().unwrap_or_default();
    let database_url = args.database_url.clone().unwrap_or(settings.database.url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let event_repo = SqliteEventRepository::new(db_pool.clone());

    seed_admin(&user_repo, &args).await?;

    if args.demo {
        seed_demo(&user_repo, &event_repo, &args).await?;
    }

    println!("✅ Seeding complete");
    Ok(())
}

async fn seed_admin(user_repo: &SqliteUserRepository, args: &Args) -> anyhow::Result<()> {
    let username = args.admin_username.trim().to_lowercase();
    let email = args.admin_email.trim().to_lowercase();

    if user_repo.find_by_username(&username).await?.is_some()
        || user_repo.find_by_email(&email).await?.is_some()
    {
        println!("👤 Admin account already exists, skipping");
        return Ok(());
    }

    if args.admin_password.len() < 8 {
        anyhow::bail!("Admin password must be at least 8 characters");
    }

    user_repo.create(NewUser {
        username: username.clone(),
        email: email.clone(),
        password_hash: AuthService::hash_password(&args.admin_password).await?,
        phone: "0000000000".to_string(),
        terms_accepted: true,
        profile: UserProfile::Admin(AdminProfile {
            fullname: Some("Administrator".to_string()),
        }),
    }).await?;

    println!("👤 Created admin account {} <{}>", username, email);
    Ok(())
}

async fn seed_demo(
    user_repo: &SqliteUserRepository,
    event_repo: &SqliteEventRepository,
    args: &Args,
) -> anyhow::Result<()> {
    let password_hash = AuthService::hash_password(DEMO_PASSWORD).await?;
    let batch: u16 = rand::thread_rng().gen_range(1000..=9999);
    let event_types = [EventType::Hackathon, EventType::CodingCompetition, EventType::ProjectExpo, EventType::Workshop];

    println!("🏫 Creating {} institutes...", args.institutes);
    let mut institutes = Vec::with_capacity(args.institutes);
    for i in 0..args.institutes {
        let name: String = CompanyName().fake();
        let institute_name = format!("{} Institute of Technology", name);
        let city: String = CityName().fake();

        let institute = user_repo.create(NewUser {
            username: institute_username(&institute_name, batch),
            email: format!("institute{}.{}@demo.eventhub.local", i, batch),
            password_hash: password_hash.clone(),
            phone: "9876543210".to_string(),
            terms_accepted: true,
            profile: UserProfile::Institute(InstituteProfile {
                institute_name,
                institute_type: InstituteType::Engineering,
                address: format!("{} Campus Road", i + 1),
                city,
                state: "Karnataka".to_string(),
                pincode: "560001".to_string(),
                country: "India".to_string(),
                established_year: rand::thread_rng().gen_range(1950..=2015),
                affiliated_to: None,
                website: None,
                contact_person_name: Name().fake(),
                designation: "Dean".to_string(),
            }),
        }).await?;
        institutes.push(institute);
    }

    println!("🎓 Creating {} students...", args.students);
    let mut students = Vec::with_capacity(args.students);
    for i in 0..args.students {
        let university = institutes
            .choose(&mut rand::thread_rng())
            .and_then(|u| u.institute_summary())
            .map(|s| s.institute_name)
            .unwrap_or_else(|| "Independent".to_string());
        let major = MAJORS.choose(&mut rand::thread_rng()).copied().unwrap_or("Undeclared");

        let student = user_repo.create(NewUser {
            username: format!("student{}x{}", i, batch),
            email: format!("student{}.{}@demo.eventhub.local", i, batch),
            password_hash: password_hash.clone(),
            phone: "9123456780".to_string(),
            terms_accepted: true,
            profile: UserProfile::Student(StudentProfile {
                fullname: Name().fake(),
                student_id: format!("STU{}{:03}", batch, i),
                major: major.to_string(),
                university,
            }),
        }).await?;
        students.push(student);
    }

    println!("📅 Creating events...");
    let now = Utc::now();
    let mut created = 0;
    for institute in &institutes {
        for (offset, event_type) in event_types.iter().enumerate() {
            let event_date = now + Duration::days(14 + 7 * offset as i64);
            let description: String = Sentence(8..16).fake();

            let event = event_repo.create(institute.id, EventDraft {
                name: format!("{} {}", event_type.as_str().replace('-', " "), offset + 1),
                event_type: *event_type,
                description,
                event_date,
                deadline: event_date - Duration::days(3),
                venue: "Main Auditorium".to_string(),
                timings: Some("10:00 - 17:00".to_string()),
                fee: (offset as f64) * 100.0,
                capacity: rand::thread_rng().gen_range(5..=30),
            }).await?;

            let mut roster = students.clone();
            roster.shuffle(&mut rand::thread_rng());
            let take = rand::thread_rng().gen_range(0..=roster.len().min(5));
            for student in roster.iter().take(take) {
                event_repo.try_register(event.id, student.id, now).await?;
            }
            created += 1;
        }
    }

    println!("  ✅ Created {} events (demo password: {})", created, DEMO_PASSWORD);
    Ok(())
}
