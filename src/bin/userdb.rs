use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use userdb::config::{self, DatabaseConfig};
use userdb::{QueryExecutor, User};

const USAGE: &str = "Usage: userdb [--config FILE] [--database PATH] <ID>";
const FALLBACK_DATABASE: &str = "userdb.db";

#[derive(Debug, Default, PartialEq)]
struct Invocation {
    config: Option<PathBuf>,
    database: Option<String>,
    id: i64,
}

fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut config = None;
    let mut database = None;
    let mut id = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = iter.next().ok_or("--config needs a file")?;
                config = Some(PathBuf::from(value));
            }
            "--database" | "-d" => {
                let value = iter.next().ok_or("--database needs a path")?;
                database = Some(value.clone());
            }
            other if id.is_none() => {
                let parsed = other
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid user id: {}", other))?;
                id = Some(parsed);
            }
            other => return Err(format!("Unexpected argument: {}", other)),
        }
    }

    Ok(Invocation {
        config,
        database,
        id: id.ok_or("Missing user id")?,
    })
}

fn resolve_config(invocation: &Invocation) -> userdb::Result<DatabaseConfig> {
    let mut db_config = match &invocation.config {
        Some(path) => config::load_config(path)?.database,
        None => match config::default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "Using default configuration file");
                config::load_config(path)?.database
            }
            None => {
                let mut fallback = DatabaseConfig::new(FALLBACK_DATABASE);
                fallback.read_only = true;
                fallback
            }
        },
    };

    if let Some(path) = &invocation.database {
        db_config.path = path.clone();
    }
    Ok(db_config)
}

fn run(invocation: &Invocation) -> userdb::Result<Option<String>> {
    let db_config = resolve_config(invocation)?;
    let executor = QueryExecutor::connect(&db_config)?;
    Ok(User::find_by_id(&executor, invocation.id)?.map(|user| user.to_string()))
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the user record
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    info!(id = invocation.id, "Looking up user");
    match run(&invocation) {
        Ok(Some(text)) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("No user with id {}", invocation.id);
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_id_only() {
        let invocation = parse_args(&args(&["42"])).unwrap();
        assert_eq!(invocation.id, 42);
        assert_eq!(invocation.config, None);
        assert_eq!(invocation.database, None);
    }

    #[test]
    fn test_parse_options() {
        let invocation = parse_args(&args(&["--config", "/etc/userdb.toml", "-d", "users.db", "7"])).unwrap();
        assert_eq!(invocation.config, Some(PathBuf::from("/etc/userdb.toml")));
        assert_eq!(invocation.database.as_deref(), Some("users.db"));
        assert_eq!(invocation.id, 7);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&[])).unwrap_err().contains("Missing user id"));
        assert!(parse_args(&args(&["abc"])).unwrap_err().contains("Invalid user id"));
        assert!(parse_args(&args(&["1", "2"])).unwrap_err().contains("Unexpected argument"));
        assert!(parse_args(&args(&["--config"])).is_err());
    }

    #[test]
    fn test_database_flag_overrides_config_path() {
        let invocation = Invocation {
            database: Some(":memory:".to_string()),
            id: 1,
            ..Default::default()
        };
        let db_config = resolve_config(&invocation).unwrap();
        assert!(db_config.is_in_memory());
    }
}
