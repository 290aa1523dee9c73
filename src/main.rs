/// Version injected at compile time via MCCLIENT_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("MCCLIENT_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use mcclient::config::Config;
use mcclient::error::format_error;
use mcclient::modulebase::{Getter, ManagerContext, Module, Mutator, Registry, ResourceManager};
use mcclient::modules::default_registry;
use mcclient::session::{ClientSession, Session};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command line client for the cloud control plane
#[derive(Parser, Debug)]
#[command(name = "mcclient", version, about, long_about = None)]
struct Args {
    /// Config file (JSON or YAML); defaults to the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Access token, overrides config and environment
    #[arg(long, global = true)]
    token: Option<String>,

    /// API version used for module lookup
    #[arg(long, global = true)]
    api_version: Option<String>,

    /// Service endpoint as service=url, may be repeated
    #[arg(long = "endpoint", global = true, value_name = "SERVICE=URL")]
    endpoints: Vec<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered modules
    Modules,
    /// List resources
    List {
        module: String,
        /// Follow paging and fetch every item
        #[arg(long)]
        all: bool,
        /// Print every field instead of the module's columns
        #[arg(long)]
        raw: bool,
        #[command(flatten)]
        scope: Scope,
    },
    /// Show one resource by id or name
    Show {
        module: String,
        id: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// Create a resource, or several with --count
    Create {
        module: String,
        #[arg(long)]
        count: Option<usize>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Replace fields of one or more resources
    Update {
        module: String,
        #[arg(required = true)]
        ids: Vec<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Patch one or more resources
    Patch {
        module: String,
        #[arg(required = true)]
        ids: Vec<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Delete one or more resources
    Delete {
        module: String,
        #[arg(required = true)]
        ids: Vec<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Perform an action on resources, or on the collection when no id is given
    Action {
        module: String,
        action: String,
        ids: Vec<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Show metadata, or set it when params are given
    Metadata {
        module: String,
        id: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// Attach slaves to a master through a joint module
    Attach {
        joint: String,
        master_id: String,
        #[arg(required = true)]
        slave_ids: Vec<String>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Detach slaves from a master
    Detach {
        joint: String,
        master_id: String,
        #[arg(required = true)]
        slave_ids: Vec<String>,
    },
    /// List the slaves of a master, or with --reverse the masters of a slave
    Joints {
        joint: String,
        id: String,
        #[arg(long)]
        reverse: bool,
        #[command(flatten)]
        scope: Scope,
    },
    /// Print the server version of the service behind a module
    Version { module: String },
}

/// Parameters and parent contexts shared by resource commands
#[derive(ClapArgs, Debug, Default)]
struct Scope {
    /// Parameter as key=value, may be repeated
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Parameters as a JSON object, merged under --param
    #[arg(long)]
    data: Option<String>,

    /// Parent resource as module=id, outermost first
    #[arg(long = "context", value_name = "MODULE=ID")]
    contexts: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("mcclient {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("mcclient").join("mcclient.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".mcclient").join("mcclient.log");
    }
    PathBuf::from("mcclient.log")
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    config.apply_env();

    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    if let Some(version) = &args.api_version {
        config.api_version = Some(version.clone());
    }
    for endpoint in &args.endpoints {
        let (service, url) = endpoint
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid endpoint {:?}, expected SERVICE=URL", endpoint))?;
        config = config.with_endpoint(service, url);
    }

    Ok(config)
}

/// Merge `--data` and `--param` into one JSON object; values parse as JSON
/// when they can, otherwise stay strings
fn parse_params(scope: &Scope) -> Result<Option<Value>> {
    let mut params = match &scope.data {
        Some(data) => match serde_json::from_str::<Value>(data).context("Invalid --data JSON")? {
            Value::Object(map) => map,
            _ => bail!("--data must be a JSON object"),
        },
        None => Map::new(),
    };

    for param in &scope.params {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid param {:?}, expected KEY=VALUE", param))?;
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        params.insert(key.to_string(), value);
    }

    Ok((!params.is_empty()).then_some(Value::Object(params)))
}

fn resolve_contexts(
    registry: &Registry,
    session: &dyn Session,
    scope: &Scope,
) -> Result<Vec<(Module, String)>> {
    scope
        .contexts
        .iter()
        .map(|ctx| {
            let (keyword, id) = ctx
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid context {:?}, expected MODULE=ID", ctx))?;
            Ok((registry.get_module(session, keyword)?, id.to_string()))
        })
        .collect()
}

fn resource(registry: &Registry, s: &dyn Session, keyword: &str) -> Result<ResourceManager> {
    Ok(registry.get_module(s, keyword)?.resource().clone())
}

fn context_refs(contexts: &[(Module, String)]) -> Vec<ManagerContext<'_>> {
    contexts
        .iter()
        .map(|(module, id)| ManagerContext::new(module.manager(), id))
        .collect()
}

/// Keep only the module's display columns
fn project_columns(item: &Value, columns: &[String]) -> Value {
    let Some(obj) = item.as_object() else {
        return item.clone();
    };
    let projected: Map<String, Value> = columns
        .iter()
        .filter_map(|c| obj.get(c).map(|v| (c.clone(), v.clone())))
        .collect();
    Value::Object(projected)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let session = ClientSession::new(&config)?;
    let registry = default_registry()?;
    let s: &dyn Session = &session;

    match &args.command {
        Command::Modules => {
            for keyword in registry.registered_modules(s.get_api_version()) {
                println!("{}", keyword);
            }
        },
        Command::List {
            module,
            all,
            raw,
            scope,
        } => {
            let mgr = resource(&registry, s, module)?;
            let params = parse_params(scope)?;
            let contexts = resolve_contexts(&registry, s, scope)?;
            let ctxs = context_refs(&contexts);
            let mut result = if *all {
                mgr.list_all_in_contexts(s, params.as_ref(), &ctxs).await?
            } else {
                mgr.list_in_contexts(s, params.as_ref(), &ctxs).await?
            };
            if !raw {
                let columns = mgr.get_columns(s);
                if !columns.is_empty() {
                    result.data = result
                        .data
                        .iter()
                        .map(|item| project_columns(item, &columns))
                        .collect();
                }
            }
            print_json(&result.to_json())?;
        },
        Command::Show { module, id, scope } => {
            let mgr = resource(&registry, s, module)?;
            let contexts = resolve_contexts(&registry, s, scope)?;
            let obj = mgr
                .get_in_contexts(s, id, parse_params(scope)?.as_ref(), &context_refs(&contexts))
                .await?;
            print_json(&obj)?;
        },
        Command::Create {
            module,
            count,
            scope,
        } => {
            let mgr = resource(&registry, s, module)?;
            let params = parse_params(scope)?;
            let contexts = resolve_contexts(&registry, s, scope)?;
            let ctxs = context_refs(&contexts);
            match count {
                Some(count) if *count > 1 => {
                    let results = mgr
                        .batch_create_in_contexts(s, params.as_ref(), *count, &ctxs)
                        .await;
                    print_json(&results)?;
                },
                _ => print_json(&mgr.create_in_contexts(s, params.as_ref(), &ctxs).await?)?,
            }
        },
        Command::Update { module, ids, scope } => {
            let mgr = resource(&registry, s, module)?;
            let params = parse_params(scope)?;
            let contexts = resolve_contexts(&registry, s, scope)?;
            let ctxs = context_refs(&contexts);
            if let [id] = ids.as_slice() {
                print_json(&mgr.put_in_contexts(s, id, params.as_ref(), &ctxs).await?)?;
            } else {
                print_json(&mgr.batch_put_in_contexts(s, ids, params.as_ref(), &ctxs).await)?;
            }
        },
        Command::Patch { module, ids, scope } => {
            let mgr = resource(&registry, s, module)?;
            let params = parse_params(scope)?;
            let contexts = resolve_contexts(&registry, s, scope)?;
            let ctxs = context_refs(&contexts);
            if let [id] = ids.as_slice() {
                print_json(&mgr.patch_in_contexts(s, id, params.as_ref(), &ctxs).await?)?;
            } else {
                print_json(&mgr.batch_patch_in_contexts(s, ids, params.as_ref(), &ctxs).await)?;
            }
        },
        Command::Delete { module, ids, scope } => {
            let mgr = resource(&registry, s, module)?;
            let params = parse_params(scope)?;
            let contexts = resolve_contexts(&registry, s, scope)?;
            let ctxs = context_refs(&contexts);
            if let [id] = ids.as_slice() {
                let deleted = mgr
                    .delete_in_contexts(s, id, params.as_ref(), None, &ctxs)
                    .await?;
                print_json(&deleted)?;
            } else {
                let results = mgr
                    .batch_delete_in_contexts(s, ids, params.as_ref(), None, &ctxs)
                    .await;
                print_json(&results)?;
            }
        },
        Command::Action {
            module,
            action,
            ids,
            scope,
        } => {
            let mgr = resource(&registry, s, module)?;
            let params = parse_params(scope)?;
            let contexts = resolve_contexts(&registry, s, scope)?;
            let ctxs = context_refs(&contexts);
            match ids.as_slice() {
                [] => {
                    let result = mgr
                        .perform_class_action_in_contexts(s, action, params.as_ref(), &ctxs)
                        .await?;
                    print_json(&result)?;
                },
                [id] => {
                    let result = mgr
                        .perform_action_in_contexts(s, id, action, params.as_ref(), &ctxs)
                        .await?;
                    print_json(&result)?;
                },
                _ => {
                    let results = mgr
                        .batch_perform_action_in_contexts(s, ids, action, params.as_ref(), &ctxs)
                        .await;
                    print_json(&results)?;
                },
            }
        },
        Command::Metadata { module, id, scope } => {
            let mgr = resource(&registry, s, module)?;
            let result = match parse_params(scope)? {
                Some(params) => mgr.set_metadata(s, id, Some(&params)).await?,
                None => mgr.get_metadata(s, id, None).await?,
            };
            print_json(&result)?;
        },
        Command::Attach {
            joint,
            master_id,
            slave_ids,
            scope,
        } => {
            let mgr = registry.get_joint_module(s, joint)?;
            let params = parse_params(scope)?;
            if let [sid] = slave_ids.as_slice() {
                print_json(&mgr.attach(s, master_id, sid, params.as_ref()).await?)?;
            } else {
                print_json(&mgr.batch_attach(s, master_id, slave_ids, params.as_ref()).await)?;
            }
        },
        Command::Detach {
            joint,
            master_id,
            slave_ids,
        } => {
            let mgr = registry.get_joint_module(s, joint)?;
            print_json(&mgr.batch_detach(s, master_id, slave_ids).await)?;
        },
        Command::Joints {
            joint,
            id,
            reverse,
            scope,
        } => {
            let mgr = registry.get_joint_module(s, joint)?;
            let params = parse_params(scope)?;
            let result = if *reverse {
                mgr.list_ascendent(s, id, params.as_ref()).await?
            } else {
                mgr.list_descendent(s, id, params.as_ref()).await?
            };
            print_json(&result.to_json())?;
        },
        Command::Version { module } => {
            let mgr = resource(&registry, s, module)?;
            println!("{}", mgr.base.get_version(s).await?);
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {}", format_error(&err));
            std::process::exit(1);
        },
    };

    if let Err(err) = run(args).await {
        tracing::error!("command failed: {:#}", err);
        eprintln!("Error: {}", format_error(&err));
        std::process::exit(1);
    }
}
