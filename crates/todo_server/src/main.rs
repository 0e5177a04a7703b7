use log::error;
use std::process::ExitCode;
use todo_server::config::ServerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("todo_server: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = todo_server::init_logging(&config) {
        eprintln!("todo_server: {err}");
        return ExitCode::FAILURE;
    }

    match todo_server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_exit module=server status=error error={err}");
            eprintln!("todo_server: {err}");
            ExitCode::FAILURE
        }
    }
}
