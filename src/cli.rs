//! Command-line interface for the dbuser binary.
//!
//! Every command except `hash` reads a configuration file (json/yaml/toml),
//! applies overrides, validates it and initializes tracing before touching
//! the database.
//!
//! # Usage
//!
//! ```bash
//! # Resolve and print the provider settings without connecting
//! dbuser -c dbuser.toml check
//!
//! # Check a password (read from stdin when --password is omitted)
//! dbuser -c dbuser.toml verify -u alice -p hunter2
//!
//! # Page through users matching a search term
//! dbuser -c dbuser.toml users --search ali --first 20 --max 20
//!
//! # Produce a stored hash for seeding a table
//! dbuser hash -p hunter2 --function PBKDF2-SHA256 --pbkdf2-salt s4lt
//! ```

use std::collections::BTreeSet;
use std::error::Error;
use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dbuser_auth::hash::{hash_bcrypt, hash_pbkdf2_sha256};
use dbuser_auth::sql::{DataSource, Pageable};
use dbuser_auth::{
    AuthError, CredentialValidator, DbUserStore, HashScheme, PUBLIC_FAILURE_MESSAGE,
    PasswordEncoding, SaltLocation, UserRecord, combine_salt,
};
use dbuser_config::{
    CliOverrides, Config, LoggingConfig, apply_overrides, load_config, validate_config,
};
use tabled::builder::Builder;
use tabled::{Table, Tabled};
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// dbuser CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dbuser",
    version,
    about = "Authenticate and look up database-resident users",
    propagate_version = true
)]
pub struct DbUserArgs {
    /// Config file path (json/yaml/toml)
    #[arg(short, long, default_value = "dbuser.toml", global = true)]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: CliOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate the configuration and print the resolved provider settings.
    Check,

    /// Check a username and password against the database.
    Verify {
        /// Username to check.
        #[arg(short, long)]
        username: String,

        /// Cleartext password; read from the first line of stdin when omitted.
        #[arg(short, long, env = "DBUSER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// List users, optionally filtered by a search term and paged.
    Users {
        /// Search term bound to every placeholder of findBySearchTerm.
        #[arg(short, long)]
        search: Option<String>,

        /// Index of the first row to return.
        #[arg(long, default_value_t = 0)]
        first: u64,

        /// Page size.
        #[arg(long, default_value_t = 20)]
        max: u32,

        /// Return every row instead of one page.
        #[arg(long, conflicts_with_all = ["first", "max"])]
        all: bool,

        /// Output format (table, json, csv).
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Count users, optionally only those matching a search term.
    Count {
        /// Search term.
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a single user.
    Find {
        /// Look up by primary key.
        #[arg(long, group = "target", required_unless_present = "username")]
        id: Option<String>,

        /// Look up by username.
        #[arg(short, long, group = "target")]
        username: Option<String>,

        /// Output format (table, json).
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Print the stored form of a password (for seeding tables).
    Hash(HashArgs),
}

#[derive(Args, Debug, Clone)]
pub struct HashArgs {
    /// Password to hash.
    #[arg(short, long)]
    pub password: String,

    /// Digest name, Blowfish, or PBKDF2-SHA256.
    #[arg(long = "function", default_value = "SHA-256")]
    pub hash_function: String,

    /// Password encoding (UTF-8, UTF-16, UTF-16BE, UTF-16LE).
    #[arg(long, default_value = "UTF-8")]
    pub encoding: String,

    /// Base64 salt value, as stored in the salt column.
    #[arg(long)]
    pub salt: Option<String>,

    /// Where the salt goes (None, Prepend, Append).
    #[arg(long, default_value = "None")]
    pub salt_location: String,

    /// Salt embedded in PBKDF2-SHA256 output.
    #[arg(long)]
    pub pbkdf2_salt: Option<String>,

    /// PBKDF2-SHA256 iteration count.
    #[arg(long, default_value_t = 27500)]
    pub iterations: u32,

    /// bcrypt cost.
    #[arg(long, default_value_t = 10)]
    pub cost: u32,
}

/// Resolved setting for display.
#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Run the CLI with the given arguments.
pub async fn run(args: DbUserArgs) -> Result<(), Box<dyn Error>> {
    if let Command::Hash(opts) = &args.command {
        println!("{}", hash_password(opts)?);
        return Ok(());
    }

    let mut config = load_config(&args.config)?;
    apply_overrides(&mut config, &args.overrides);
    validate_config(&config)?;

    init_tracing(&config.logging);

    match args.command {
        Command::Check => print_settings(&config),
        Command::Verify { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let store = open_store(&config).await?;
            verify(&store, &username, &password).await
        }
        Command::Users {
            search,
            first,
            max,
            all,
            format,
        } => {
            let page = if all {
                None
            } else {
                Some(Pageable::new(first, max)?)
            };
            let store = open_store(&config).await?;
            let users = store.find_users(search.as_deref(), page).await?;
            print_records(&users, &format)
        }
        Command::Count { search } => {
            let store = open_store(&config).await?;
            println!("{}", store.count_users(search.as_deref()).await?);
            Ok(())
        }
        Command::Find {
            id,
            username,
            format,
        } => {
            let store = open_store(&config).await?;
            let user = match (id, username) {
                (Some(id), _) => store.find_by_id(&id).await?,
                (None, Some(name)) => store.find_by_username(&name).await?,
                (None, None) => None,
            };
            match user {
                Some(user) => print_records(std::slice::from_ref(&user), &format),
                None => Err("user not found".into()),
            }
        }
        Command::Hash(_) => Ok(()),
    }
}

async fn open_store(config: &Config) -> Result<DbUserStore, Box<dyn Error>> {
    let queries = config.query_config()?;
    let source = DataSource::connect(&config.datasource_config()).await?;
    Ok(DbUserStore::new(source, queries)?)
}

async fn verify(
    store: &DbUserStore,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn Error>> {
    match store.validate_credentials(username, password).await {
        Ok(true) => {
            info!(username, "credentials accepted");
            println!("ok");
            Ok(())
        }
        Ok(false) => Err(PUBLIC_FAILURE_MESSAGE.into()),
        Err(e) => {
            error!(username, error = %e, "credential check failed");
            Err(e.public_message().into())
        }
    }
}

fn read_password() -> Result<String, Box<dyn Error>> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_settings(config: &Config) -> Result<(), Box<dyn Error>> {
    let queries = config.query_config()?;
    let rows = vec![
        SettingRow {
            setting: "RDBMS",
            value: queries.rdbms.to_string(),
        },
        SettingRow {
            setting: "Hash function",
            value: queries.hash_scheme.to_string(),
        },
        SettingRow {
            setting: "Hash is Base64",
            value: queries.hash_is_base64.to_string(),
        },
        SettingRow {
            setting: "Password encoding",
            value: queries.password_encoding.to_string(),
        },
        SettingRow {
            setting: "Salt location",
            value: queries.salt_location.to_string(),
        },
        SettingRow {
            setting: "Allow delete",
            value: queries.allow_delete.to_string(),
        },
        SettingRow {
            setting: "Allow overwrite",
            value: queries.allow_overwrite.to_string(),
        },
        SettingRow {
            setting: "Max connections",
            value: config.datasource.max_connections.to_string(),
        },
    ];
    println!("{}", Table::new(rows));
    Ok(())
}

fn print_records(records: &[UserRecord], format: &str) -> Result<(), Box<dyn Error>> {
    if records.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let columns: BTreeSet<&str> = records.iter().flat_map(|r| r.columns()).collect();
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(records)?),
        "csv" => {
            println!("{}", csv_line(columns.iter().copied()));
            for record in records {
                println!(
                    "{}",
                    csv_line(columns.iter().map(|c| record.get(c).unwrap_or("")))
                );
            }
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(columns.iter().copied());
            for record in records {
                builder.push_record(columns.iter().map(|c| record.get(c).unwrap_or("-")));
            }
            println!("{}", builder.build());
            println!("\nTotal: {} user(s)", records.len());
        }
    }
    Ok(())
}

/// One CSV row, quoting fields that contain a comma, quote or line break.
fn csv_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields
        .map(|field| {
            if field.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Produce the value a table would store for `opts.password`.
pub fn hash_password(opts: &HashArgs) -> Result<String, AuthError> {
    let scheme: HashScheme = opts.hash_function.parse()?;
    let location: SaltLocation = opts.salt_location.parse()?;
    if location.is_salted() && opts.salt.is_none() {
        return Err(AuthError::config(format!(
            "--salt is required with salt location {location}"
        )));
    }

    let encoded = PasswordEncoding::from_name(&opts.encoding).encode(&opts.password);
    let password = combine_salt(&encoded, opts.salt.as_deref().unwrap_or(""), location)?;
    match scheme {
        HashScheme::Digest(alg) => Ok(alg.hex_digest(&password)),
        HashScheme::Blowfish => hash_bcrypt(&password, opts.cost),
        HashScheme::Pbkdf2Sha256 => {
            let salt = opts.pbkdf2_salt.as_deref().ok_or_else(|| {
                AuthError::config("--pbkdf2-salt is required for PBKDF2-SHA256")
            })?;
            hash_pbkdf2_sha256(&password, salt, opts.iterations)
        }
    }
}

/// Filter directives for the base level plus per-module overrides.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = config.level.as_deref().unwrap_or("info").to_string();
    let mut modules: Vec<_> = config.filters.iter().collect();
    modules.sort();
    for (module, level) in modules {
        directives.push(',');
        directives.push_str(module);
        directives.push('=');
        directives.push_str(level);
    }
    directives
}

/// Install the global subscriber described by `config`.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_new(filter_directives(config)).unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match config.output.as_deref() {
        Some("stdout") => BoxMakeWriter::new(io::stdout),
        _ => BoxMakeWriter::new(io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format.as_deref().unwrap_or("pretty") {
        "json" => registry.with(fmt::layer().json().with_writer(writer)).init(),
        "compact" => registry
            .with(fmt::layer().compact().with_writer(writer))
            .init(),
        _ => registry.with(fmt::layer().with_writer(writer)).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbuser_auth::DigestAlgorithm;

    fn hash_args(password: &str, hash_function: &str) -> HashArgs {
        HashArgs {
            password: password.into(),
            hash_function: hash_function.into(),
            encoding: "UTF-8".into(),
            salt: None,
            salt_location: "None".into(),
            pbkdf2_salt: None,
            iterations: 1000,
            cost: 4,
        }
    }

    #[test]
    fn parses_verify() {
        let args = DbUserArgs::try_parse_from([
            "dbuser", "-c", "my.yaml", "verify", "-u", "alice", "--password", "pw",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("my.yaml"));
        match args.command {
            Command::Verify { username, password } => {
                assert_eq!(username, "alice");
                assert_eq!(password.as_deref(), Some("pw"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_users_paging() {
        let args = DbUserArgs::try_parse_from([
            "dbuser", "users", "--search", "ali", "--first", "40", "--max", "10",
        ])
        .unwrap();
        match args.command {
            Command::Users {
                search, first, max, all, ..
            } => {
                assert_eq!(search.as_deref(), Some("ali"));
                assert_eq!((first, max, all), (40, 10, false));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(DbUserArgs::try_parse_from(["dbuser", "users", "--all", "--max", "5"]).is_err());
    }

    #[test]
    fn find_needs_a_target() {
        assert!(DbUserArgs::try_parse_from(["dbuser", "find"]).is_err());
        assert!(
            DbUserArgs::try_parse_from(["dbuser", "find", "--id", "1", "--username", "a"])
                .is_err()
        );
        assert!(DbUserArgs::try_parse_from(["dbuser", "find", "--username", "a"]).is_ok());
    }

    #[test]
    fn database_override_flag() {
        let args = DbUserArgs::try_parse_from([
            "dbuser",
            "--database",
            "sqlite::memory:",
            "--log-level",
            "debug",
            "count",
        ])
        .unwrap();
        assert_eq!(args.overrides.database.as_deref(), Some("sqlite::memory:"));
        assert_eq!(args.overrides.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn hash_digest() {
        let out = hash_password(&hash_args("hunter2", "SHA-256")).unwrap();
        assert_eq!(out, DigestAlgorithm::Sha256.hex_digest(b"hunter2"));
    }

    #[test]
    fn hash_salted_digest_verifies() {
        let mut opts = hash_args("hunter2", "SHA-1");
        opts.salt = Some("c2FsdA==".into());
        opts.salt_location = "Append".into();
        let out = hash_password(&opts).unwrap();
        assert_eq!(out, DigestAlgorithm::Sha1.hex_digest(b"hunter2salt"));

        opts.salt = None;
        assert!(matches!(hash_password(&opts), Err(AuthError::Config(_))));
    }

    #[test]
    fn hash_pbkdf2_verifies() {
        let mut opts = hash_args("hunter2", "PBKDF2-SHA256");
        assert!(hash_password(&opts).is_err());
        opts.pbkdf2_salt = Some("s4lt".into());
        let stored = hash_password(&opts).unwrap();
        assert!(stored.starts_with("pbkdf2_sha256$1000$s4lt$"));
        assert!(HashScheme::Pbkdf2Sha256.verify(b"hunter2", &stored).unwrap());
    }

    #[test]
    fn hash_bcrypt_verifies() {
        let stored = hash_password(&hash_args("hunter2", "Blowfish")).unwrap();
        assert!(HashScheme::Blowfish.verify(b"hunter2", &stored).unwrap());
        assert!(!HashScheme::Blowfish.verify(b"hunter3", &stored).unwrap());
    }

    #[test]
    fn csv_fields_are_quoted() {
        assert_eq!(csv_line(["1", "alice", ""].into_iter()), "1,alice,");
        assert_eq!(
            csv_line(["Smith, Jane", "say \"hi\"", "two\nlines"].into_iter()),
            "\"Smith, Jane\",\"say \"\"hi\"\"\",\"two\nlines\""
        );
    }

    #[test]
    fn filter_directives_sorted() {
        let mut config = LoggingConfig {
            level: Some("warn".into()),
            ..Default::default()
        };
        config.filters.insert("sqlx".into(), "error".into());
        config.filters.insert("dbuser_auth".into(), "debug".into());
        assert_eq!(
            filter_directives(&config),
            "warn,dbuser_auth=debug,sqlx=error"
        );
        assert_eq!(filter_directives(&LoggingConfig::default()), "info");
    }
}
