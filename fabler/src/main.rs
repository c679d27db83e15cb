mod verbose;

use clap::{FromArgMatches as _, IntoApp as _, Parser, Subcommand};
use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};
use twelf::Layer;

use fabler_common::Conf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(flatten)]
    verbose: verbose::Verbosity,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a story from a premise
    Generate {
        /// The premise the story grows from
        premise: String,

        /// One of the eight supported styles, anything else gets a generic tone
        #[clap(long, default_value = "adventurous")]
        style: String,

        /// Target length, one of `short`, `medium`, or `long`
        #[clap(long, default_value = "short")]
        length: String,

        /// Write the story, with its premise header, to this file
        #[clap(long)]
        output: Option<std::path::PathBuf>,
    },
    /// Print the bundled example premises
    Examples,
    /// Start the built-in web server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), fabler_common::Report> {
    fabler_common::install()?;

    let matches = Cli::command().args(&Conf::clap_args()).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let conf = Conf::with_layers(&[
        Layer::Env(Some("FABLER_".to_string())),
        Layer::Clap(matches),
    ])?;

    let subscriber = Registry::default()
        .with(ErrorLayer::default())
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
        .with(EnvFilter::from_default_env().add_directive(cli.verbose.log_level_filter().into()));

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Generate {
            premise,
            style,
            length,
            output,
        } => {
            fabler_command_generate::run(&conf, &premise, &style, &length, output.as_deref())
                .await?
        }
        Commands::Examples => {
            for (premise, style) in fabler_prompt::EXAMPLE_PREMISES {
                println!("{:<12} {}", style, premise);
            }
        }
        Commands::Serve => fabler_command_serve::run(&conf).await?,
    }

    Ok(())
}
