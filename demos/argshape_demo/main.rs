//! # argshape demo application
//!
//! A sample CLI tool built from a single schema. It exists to demonstrate and
//! manually verify argshape's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example argshape_demo -- greet world
//! cargo run --example argshape_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                | How to exercise it                                                   |
//! |------------------------|----------------------------------------------------------------------|
//! | Schema defaults        | `cargo run --example argshape_demo -- greet world`                   |
//! | Config file (cwd)      | Create `argshape-demo.toml` in cwd, then run `greet world`           |
//! | Env var override       | `ARGSHAPE_DEMO__COLOR=red cargo run --example argshape_demo -- greet x` |
//! | Nested env var         | `ARGSHAPE_DEMO__SERVER__PORT=9999 cargo run --example argshape_demo -- serve` |
//! | Aliases and counts     | `cargo run --example argshape_demo -- -vvv greet world`              |
//! | Enum choices           | `cargo run --example argshape_demo -- --color teal greet x` (fails)  |
//! | Command aliases        | `cargo run --example argshape_demo -- hi world --times 2`            |
//! | Deprecated option      | `cargo run --example argshape_demo -- --loud greet world`            |
//! | Tracing output         | `RUST_LOG=argshape=debug cargo run --example argshape_demo -- serve` |

use std::process::ExitCode;

use argshape::{
    Argshape, ArgshapeError, OptionMeta, Resolved, Schema, SearchPath, Shape, middleware,
};
use serde::Deserialize;
use toml::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Server {
    host: String,
    port: u16,
}

fn schema() -> Result<Schema, ArgshapeError> {
    let server = Shape::new()
        .field("host", Schema::string().default("127.0.0.1"))
        .field("port", Schema::number().default(8080));

    Ok(Schema::object(
        Shape::new()
            .field(
                "verbose",
                Schema::number()
                    .count()?
                    .alias("v")
                    .global()
                    .describe("Increase output detail")
                    .default(0),
            )
            .field(
                "color",
                Schema::enumeration(["red", "green", "yellow", "blue"])
                    .describe("Output color")
                    .default("yellow"),
            )
            .field(
                "loud",
                Schema::boolean()
                    .deprecated_with("use --color instead")?
                    .optional(),
            )
            .field("server", Schema::object(server).default(toml::Table::new())),
    ))
}

fn greet_command() -> Result<argshape::Command, ArgshapeError> {
    Ok(Schema::object(
        Shape::new().field("times", Schema::number().describe("Repeat count").default(1)),
    )
    .command(vec!["greet", "hi"], "Print a greeting")?
    .positional("name", &Schema::string(), OptionMeta::new().describe("Who to greet"))?
    .middlewares([middleware(|args| {
        if let Some(Value::String(name)) = args.get("name") {
            let shouted = name.to_uppercase();
            args.insert("shout".into(), Value::String(shouted));
        }
    })])
    .handler(|args| {
        let times = args.get("times").and_then(Value::as_integer).unwrap_or(1);
        let name = args.get("name").and_then(Value::as_str).unwrap_or_default();
        let color = args.get("color").and_then(Value::as_str).unwrap_or_default();
        for _ in 0..times {
            println!("[{color}] hello, {name}");
        }
        Ok(())
    }))
}

fn serve_command() -> argshape::Command {
    argshape::Command::new("serve", "Show the server address from config").handler(|args| {
        let section = args.get("server").and_then(Value::as_table).cloned();
        let server: Server = Value::Table(section.unwrap_or_default()).try_into()?;
        println!("would listen on {}:{}", server.host, server.port);
        Ok(())
    })
}

fn run() -> Result<Resolved, ArgshapeError> {
    Argshape::builder(schema()?)
        .app_name("argshape-demo")
        .about("argshape demo: a sample CLI built from one schema")
        .version(env!("CARGO_PKG_VERSION"))
        .add_search_path(SearchPath::Cwd)
        .command(greet_command()?)
        .command(serve_command())
        .parse()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(resolved) => {
            if resolved.args.get("verbose").and_then(Value::as_integer) > Some(0) {
                eprintln!("config: {:?}", resolved.config_path);
                eprintln!("args: {:#?}", resolved.args);
            }
            ExitCode::SUCCESS
        }
        Err(ArgshapeError::Cli(err)) => {
            let _ = err.print();
            ExitCode::from(err.exit_code() as u8)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
