use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use modbus_client::{ClientConfig, ModbusClient, Priority};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "modbus-cli", about = "Modbus RTU/ASCII command-line client")]
struct Cli {
    /// Path to a JSON config file. If omitted, built-in defaults are used.
    #[arg(long)]
    config: Option<String>,

    /// Print the default configuration as JSON and exit.
    #[arg(long)]
    dump_default_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read holding registers from a slave.
    ReadHoldingRegisters {
        unit_id: u8,
        address: u16,
        quantity: u16,
    },
    /// Write a single holding register.
    WriteSingleRegister { unit_id: u8, address: u16, value: u16 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.dump_default_config {
        match ClientConfig::default().to_json_pretty() {
            Ok(json) => {
                println!("{json}");
                return ExitCode::SUCCESS;
            }
            Err(err) => {
                eprintln!("failed to serialize default config: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = modbus_client::logging::setup_logging(&config.logging) {
        eprintln!("failed to initialize logging: {err}");
    }

    let Some(command) = cli.command else {
        eprintln!("no command given, pass --help to see available commands");
        return ExitCode::FAILURE;
    };

    let client = ModbusClient::new_serial(config);
    if let Err(err) = client.connect().await {
        error!(%err, "failed to connect to serial device");
        return ExitCode::FAILURE;
    }
    client.start().await;

    let result = run_command(&client, command).await;

    client.stop().await;
    let _ = client.disconnect().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&str>) -> Result<ClientConfig, String> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
            ClientConfig::from_json_str(&raw).map_err(|err| err.to_string())?
        }
        None => ClientConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

async fn run_command(client: &ModbusClient, command: Command) -> Result<(), modbus_client::ModbusError> {
    match command {
        Command::ReadHoldingRegisters {
            unit_id,
            address,
            quantity,
        } => {
            let registers = client
                .read_holding_registers(unit_id, address, quantity, Priority::Normal)
                .await?;
            info!(?registers, "read holding registers");
            println!("{registers:?}");
            Ok(())
        }
        Command::WriteSingleRegister { unit_id, address, value } => {
            client
                .write_single_register(unit_id, address, value, Priority::Normal)
                .await?;
            info!(unit_id, address, value, "wrote single register");
            // Give the background dispatcher a beat before disconnecting.
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        }
    }
}
