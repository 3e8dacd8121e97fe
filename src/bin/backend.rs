use chrono::Utc;
use pulsewatch::{
    ComponentReport, HealthReport, STATUS_FAILED, STATUS_OK,
    util::{get_addr, get_failed_components, get_fatal_components, get_ok_components, get_port},
};
use rocket::{State, figment::Figment, get, launch, routes, serde::json::Json};
use tracing::{debug, instrument};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[get("/healthy")]
#[instrument(skip_all)]
fn healthy(components: &State<Vec<ComponentReport>>) -> Json<HealthReport> {
    let details = components.inner().clone();
    let status = if details.iter().all(ComponentReport::is_ok) {
        STATUS_OK
    } else {
        STATUS_FAILED
    };

    Json(HealthReport {
        status: status.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        details,
    })
}

#[get("/ping")]
fn ping() {}

fn init() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter::LevelFilter::DEBUG)
        .init();
}

fn get_config() -> Figment {
    rocket::Config::figment()
        .merge(("port", get_port()))
        .merge(("address", get_addr()))
        .merge(("workers", 1))
}

fn build_components() -> Vec<ComponentReport> {
    let mut components = Vec::new();

    for name in get_ok_components() {
        components.push(ComponentReport {
            name,
            status: STATUS_OK.to_string(),
            error: None,
            fatal: false,
        });
    }

    let fatal_components = get_fatal_components();
    for name in get_failed_components() {
        let fatal = fatal_components.contains(&name);
        components.push(ComponentReport {
            name,
            status: STATUS_FAILED.to_string(),
            error: Some("component check failed".to_string()),
            fatal,
        });
    }

    components
}

#[launch]
fn rocket() -> _ {
    init();
    let figment = get_config();

    let components = build_components();
    debug!("serving health report with {} component(s)", components.len());

    rocket::custom(figment)
        .manage(components)
        .mount("/", routes![healthy, ping])
}
