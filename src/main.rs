use autocare_client::config::cli::{BookingAction, ResourceAction};
use autocare_client::utils::error::ErrorSeverity;
use autocare_client::utils::{logger, validation::Validate};
use autocare_client::{AdminApi, ApiClient, CliConfig, ClientError, Command, HealthStatus};
use clap::Parser;
use serde::Serialize;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = cli.validate() {
        fail(&e);
    }

    let config = match cli.load_client_config() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    let client = match ApiClient::new(config) {
        Ok(client) => client,
        Err(e) => fail(&e),
    };

    if let Err(e) = run(&cli, client).await {
        fail(&e);
    }
}

async fn run(cli: &CliConfig, client: ApiClient) -> Result<(), ClientError> {
    let api = AdminApi::new(client.clone());
    let page = cli.page_request();

    match &cli.command {
        Command::Health => {
            let status = client.check_health().await;
            match &status {
                HealthStatus::Healthy { attempts } => {
                    println!("✅ Backend healthy ({} attempt(s))", attempts)
                }
                HealthStatus::Unhealthy { last_error, .. } => {
                    println!("❌ Backend unhealthy: {}", last_error);
                    std::process::exit(2);
                }
                HealthStatus::Skipped => println!("⏳ Health check already running"),
            }
        }
        Command::Login { username, password } => {
            let response = api.auth.login(username, password).await?;
            print_json(&response)?;
        }
        Command::Centers { action } => match action {
            ResourceAction::List => print_json(&api.centers.list(&page).await?)?,
            ResourceAction::Get { id } => print_json(&api.centers.get(*id).await?)?,
            ResourceAction::Delete { id } => api.centers.delete(*id).await?,
        },
        Command::Parts { action } => match action {
            ResourceAction::List => print_json(&api.parts.list(&page).await?)?,
            ResourceAction::Get { id } => print_json(&api.parts.get(*id).await?)?,
            ResourceAction::Delete { id } => api.parts.delete(*id).await?,
        },
        Command::Promotions { action } => match action {
            ResourceAction::List => print_json(&api.promotions.list(&page).await?)?,
            ResourceAction::Get { id } => print_json(&api.promotions.get(*id).await?)?,
            ResourceAction::Delete { id } => api.promotions.delete(*id).await?,
        },
        Command::Users { action } => match action {
            ResourceAction::List => print_json(&api.users.list(&page).await?)?,
            ResourceAction::Get { id } => print_json(&api.users.get(*id).await?)?,
            ResourceAction::Delete { id } => api.users.delete(*id).await?,
        },
        Command::Customers { action } => match action {
            ResourceAction::List => print_json(&api.customers.list(&page).await?)?,
            ResourceAction::Get { id } => print_json(&api.customers.get(*id).await?)?,
            ResourceAction::Delete { id } => api.customers.delete(*id).await?,
        },
        Command::Vehicles { action } => match action {
            ResourceAction::List => print_json(&api.vehicles.list(&page).await?)?,
            ResourceAction::Get { id } => print_json(&api.vehicles.get(*id).await?)?,
            ResourceAction::Delete { id } => api.vehicles.delete(*id).await?,
        },
        Command::Staff { action } => match action {
            ResourceAction::List => print_json(&api.staff.list(&page).await?)?,
            ResourceAction::Get { id } => print_json(&api.staff.get(*id).await?)?,
            ResourceAction::Delete { id } => api.staff.delete(*id).await?,
        },
        Command::Bookings { action } => match action {
            BookingAction::List => print_json(&api.bookings.list(&page).await?)?,
            BookingAction::Get { id } => print_json(&api.bookings.get(*id).await?)?,
            BookingAction::Cancel { id, reason } => {
                print_json(&api.bookings.cancel(*id, reason.as_deref()).await?)?
            }
            BookingAction::Slots { center_id, date } => {
                print_json(&api.bookings.available_time_slots(*center_id, *date).await?)?
            }
        },
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ClientError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fail(e: &ClientError) -> ! {
    tracing::error!(
        "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    if let Some(api_error) = e.as_api_error() {
        tracing::debug!("Request detail: {} {} -> {}", api_error.method, api_error.url, api_error.detail);
        for (field, message) in api_error.field_errors() {
            eprintln!("  • {}: {}", field, message);
        }
    }

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Gợi ý: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
