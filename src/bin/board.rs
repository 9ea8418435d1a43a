//! # Bulletin board command-line tool
//!
//! Talks to the `org.manuel.BulletinBoard` service over the session bus.
//!
//! ```bash
//! board [--app-id <id>] put <key> <value>
//! board [--app-id <id>] get <key>
//! board ping
//! ```
//!
//! The bus is picked the same way as every other client: `BROKER_ADDR` for
//! TCP, otherwise the local socket (`BROKER_SOCKET` or the default path).
//! Set `BULLETIN_DEBUG=debug` to see each call.
use bulletin_board::board::{APP_ID, BulletinBoard};
use bulletin_board::{ClientHandle, logger};

const APP_NAME: &str = "board";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const USAGE: &str = "Usage: board [--app-id <id>] <put <key> <value> | get <key> | ping>";

fn invalid_input(msg: impl Into<String>) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.into())
}

#[derive(Debug, PartialEq)]
enum Command {
    Put { key: String, value: String },
    Get { key: String },
    Ping,
}

#[derive(Debug, PartialEq)]
enum Invocation {
    Version,
    Help,
    Run { app_id: String, command: Command },
}

/// Flags are only recognised before the command word; everything after it
/// belongs to the command.
fn parse_args(args: Vec<String>) -> std::io::Result<Invocation> {
    let mut args = args.into_iter();
    let mut app_id = APP_ID.to_string();

    let command = loop {
        match args.next().as_deref() {
            Some("--version" | "-v") => return Ok(Invocation::Version),
            Some("--help" | "-h") | None => return Ok(Invocation::Help),
            Some("--app-id") => {
                app_id = args
                    .next()
                    .ok_or_else(|| invalid_input("--app-id needs a value"))?;
            }
            Some(flag) if flag.starts_with('-') => {
                return Err(invalid_input(format!("unknown flag: {flag}")));
            }
            Some(word) => break word.to_string(),
        }
    };

    let mut operand = |name: &str| {
        args.next()
            .ok_or_else(|| invalid_input(format!("missing {name}")))
    };

    let command = match command.as_str() {
        "put" => Command::Put {
            key: operand("key")?,
            value: operand("value")?,
        },
        "get" => Command::Get {
            key: operand("key")?,
        },
        "ping" => Command::Ping,
        other => return Err(invalid_input(format!("unknown command: {other}"))),
    };

    if let Some(extra) = args.next() {
        return Err(invalid_input(format!("unexpected argument: {extra}")));
    }

    Ok(Invocation::Run { app_id, command })
}

#[tokio::main]
async fn main() -> bulletin_board::Result<()> {
    logger::setup_logger();

    let (app_id, command) = match parse_args(std::env::args().skip(1).collect()) {
        Ok(Invocation::Version) => {
            println!("{APP_NAME} version {APP_VERSION}");
            return Ok(());
        }
        Ok(Invocation::Help) => {
            println!("{USAGE}");
            return Ok(());
        }
        Ok(Invocation::Run { app_id, command }) => (app_id, command),
        Err(e) => {
            log::error!("{e}");
            eprintln!("{USAGE}");
            return Err(e.into());
        }
    };

    let proxy = ClientHandle::connect_session().await?;
    let board = BulletinBoard::new(proxy).with_app_id(&app_id);

    match command {
        Command::Put { key, value } => {
            board.put(&key, &value).await?;
            log::info!("Stored value for {key:?} in {app_id}");
        }
        Command::Get { key } => {
            let values = board.get(&key).await?;
            println!("{key} {values:?}");
        }
        Command::Ping => {
            let available = board.is_available().await?;
            println!("{}", if available { "available" } else { "not available" });
        }
    }

    Ok(())
}
