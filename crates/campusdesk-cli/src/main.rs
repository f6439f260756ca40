use campusdesk_cli::admin::{self, MIN_PASSWORD_LEN, NewAdmin};
use campusdesk_cli::seeder::{self, SeedConfig};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "campusdesk-cli")]
#[command(about = "CampusDesk CLI - Administrative tools for CampusDesk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new administrator account
    CreateAdmin {
        /// First name of the administrator
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the administrator
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake courses, subjects, staff and students
    Seed {
        /// Number of courses to create
        #[arg(short = 'c', long, default_value = "3")]
        courses: usize,

        /// Number of subjects per course
        #[arg(long, default_value = "4")]
        subjects: usize,

        /// Number of staff members
        #[arg(long, default_value = "6")]
        staff: usize,

        /// Number of students enrolled per course
        #[arg(long, default_value = "20")]
        students: usize,

        /// First year of the academic session to create
        #[arg(long, default_value = "2024")]
        start_year: i32,

        /// Weekdays of attendance history to generate
        #[arg(long, default_value = "0")]
        attendance_days: usize,
    },
    /// Clear all seeded data (keeps accounts created by hand)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match campusdesk_db::init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, first_name, last_name, email, password).await,
        Commands::Seed {
            courses,
            subjects,
            staff,
            students,
            start_year,
            attendance_days,
        } => {
            let config = SeedConfig {
                courses,
                subjects_per_course: subjects,
                staff,
                students_per_course: students,
                session_start_year: start_year,
                attendance_days,
            };
            handle_seed(&pool, config).await
        }
        Commands::ClearSeed => handle_clear_seed(&pool).await,
    }
}

fn prompt_or(value: Option<String>, prompt: &str) -> dialoguer::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Input::new().with_prompt(prompt).interact_text(),
    }
}

fn read_admin(
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> dialoguer::Result<NewAdmin> {
    let first_name = prompt_or(first_name, "First name")?;
    let last_name = prompt_or(last_name, "Last name")?;
    let email = prompt_or(email, "Email address")?;
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt(format!("Password (min {MIN_PASSWORD_LEN} characters)"))
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    Ok(NewAdmin {
        first_name,
        last_name,
        email,
        password,
    })
}

async fn handle_create_admin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) {
    let new_admin = match read_admin(first_name, last_name, email, password) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("\n❌ Failed to read input: {}", e);
            std::process::exit(1);
        }
    };

    let email = new_admin.email.clone();
    let name = format!("{} {}", new_admin.first_name, new_admin.last_name);

    match admin::create_admin(pool, new_admin).await {
        Ok(id) => {
            println!("\n✅ Administrator created successfully!");
            println!("   ID: {}", id);
            println!("   Email: {}", email);
            println!("   Name: {}", name);
        }
        Err(e) => {
            eprintln!("\n❌ Error creating administrator: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed(pool: &PgPool, config: SeedConfig) {
    if let Err(e) = seeder::seed_all(pool, config).await {
        eprintln!("\n❌ Error seeding database: {:#}", e);
        std::process::exit(1);
    }
}

async fn handle_clear_seed(pool: &PgPool) {
    if let Err(e) = seeder::clear_all(pool).await {
        eprintln!("\n❌ Error clearing seeded data: {:#}", e);
        std::process::exit(1);
    }
}
