use clap::{Parser, Subcommand};
use imaginary_client::{ImaginaryClient, OperationKind, Options, cli, config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imaginary")]
#[command(about = "Run image pipelines on an imaginary service")]
#[command(long_about = "\
Run image pipelines on an imaginary service

The source image is uploaded together with an ordered list of operations;
the service applies them in sequence and returns the result.

Operation syntax:

  name:key=value,key=value

  imaginary pipeline photo.jpg \\
      --op resize:width=800,height=600 \\
      --op convert:type=webp \\
      --output photo.webp

Run 'imaginary operations' for the list of operations and their required
parameters, and 'imaginary gen-config' for a documented imaginary.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "imaginary.toml", global = true)]
    config: PathBuf,

    /// Service base URI (overrides config and IMAGINARY_URL)
    #[arg(long, global = true)]
    service_uri: Option<String>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply operations to an image and save the result
    Pipeline {
        /// Image to upload
        file: PathBuf,
        /// Operation to apply, in order (repeatable)
        #[arg(long = "op", short = 'p')]
        ops: Vec<String>,
        /// Where to write the processed image
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Print the metadata the service reports for an image
    Info {
        /// Image to upload
        file: PathBuf,
    },
    /// List operations and their required parameters
    Operations,
    /// Print a stock imaginary.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Pipeline {
            file,
            ops,
            output: dest_path,
        } => {
            let settings = load(&cli.config, cli.service_uri)?;
            let client = ImaginaryClient::from_config(&settings);

            let mut pipeline = client.pipeline().upload_file(file);
            for arg in &ops {
                let op = cli::parse_operation(arg)?;
                pipeline = pipeline.add_operation(op.name, Options::from(op.params));
            }

            let resource = pipeline.execute_into(&settings.storage.store())?;
            let bytes = resource.len()?;
            let dest = resource.persist(&dest_path)?;
            output::print_pipeline(pipeline.operations(), &dest, bytes);
        }
        Command::Info { file } => {
            let settings = load(&cli.config, cli.service_uri)?;
            let client = ImaginaryClient::from_config(&settings);
            let info = client.pipeline().upload_file(file).info()?;
            output::print_info(&info);
        }
        Command::Operations => {
            for kind in OperationKind::ALL {
                println!("{:<15} {}", kind, kind.required_params().join(", "));
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and apply the `--service-uri` override.
fn load(
    path: &std::path::Path,
    service_uri: Option<String>,
) -> Result<config::ClientConfig, config::ConfigError> {
    let mut settings = config::load_config(path)?;
    if let Some(uri) = service_uri {
        settings.service_uri = uri;
        settings.validate()?;
    }
    Ok(settings)
}

/// `RUST_LOG` wins; otherwise warnings, raised by `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
