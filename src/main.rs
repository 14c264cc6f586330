use backup_sphere::core::infrastructure::app_config::AppConfig;
use backup_sphere::core::system::System;
use backup_sphere::utils::logging::Logging;
use macros::log;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let app_config = match AppConfig::new() {
        Ok(app_config) => app_config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = match Logging::initialize(&app_config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let system = match System::initialize(app_config).await {
        Ok(system) => system,
        Err(err) => {
            log!(err);
            return ExitCode::FAILURE;
        }
    };
    let result = system.run().await;
    system.terminate().await;
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!(err);
            ExitCode::FAILURE
        }
    }
}
