// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        environment::resolve_python,
        logging,
        pipeline::{build_portable, BuildOptions},
        pyinstaller::BundleStrategy,
        settings::PortableSettings,
    },
    anyhow::{anyhow, Context, Result},
    clap::{value_parser, Arg, ArgAction, ArgMatches, Command},
    slog::info,
    std::path::PathBuf,
};

const BUILD_ABOUT: &str = "\
Build a portable distribution of the OCR application.

PyInstaller is installed into the selected Python interpreter if it is
not importable. Previous output in portable/build, portable/dist and the
portable archive is removed before building.

The bundle directory portable/dist/<AppName> receives the executable, a
README_portable.txt, a `Start <AppName>.bat` launcher and any configured
assets. The bundle is then zipped to <AppName>-portable.zip in the
repository root.

Settings are read from portable.toml in the repository root if present.
";

const PRINT_COMMAND_ABOUT: &str = "\
Print the PyInstaller command a build would run.

Nothing is installed, removed or executed.
";

/// Arguments shared by commands that assemble a PyInstaller invocation.
fn add_selection_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("repo_root")
                .long("repo-root")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Repository root containing the application sources [default: current directory]"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Settings file to use instead of <repo-root>/portable.toml"),
        )
        .arg(
            Arg::new("icon")
                .long("icon")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Icon file to embed in the executable, relative to the current directory. Ignored if it does not exist"),
        )
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .value_parser(["onefile", "onedir"])
                .default_value(BundleStrategy::default().as_str())
                .help("How PyInstaller should lay out the bundle"),
        )
        .arg(
            Arg::new("python")
                .long("python")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Python interpreter to run PyInstaller with"),
        )
}

fn build_options(args: &ArgMatches) -> Result<BuildOptions> {
    let repo_root = match args.get_one::<PathBuf>("repo_root") {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("resolving current directory")?,
    };

    let settings = PortableSettings::resolve(
        &repo_root,
        args.get_one::<PathBuf>("config").map(|p| p.as_path()),
    )?;

    let strategy = args
        .get_one::<String>("strategy")
        .ok_or_else(|| anyhow!("strategy should have default value"))?
        .parse::<BundleStrategy>()?;

    // Relative icons resolve against the working directory.
    let icon = match args.get_one::<PathBuf>("icon") {
        Some(path) if path.is_relative() => Some(
            std::env::current_dir()
                .context("resolving current directory")?
                .join(path),
        ),
        other => other.cloned(),
    };

    Ok(BuildOptions {
        repo_root,
        settings,
        strategy,
        icon,
        python: args.get_one::<PathBuf>("python").cloned(),
        ..Default::default()
    })
}

fn command_build(logger: &slog::Logger, args: &ArgMatches) -> Result<()> {
    let options = BuildOptions {
        skip_install: args.get_flag("skip_install"),
        skip_archive: args.get_flag("no_archive"),
        ..build_options(args)?
    };
    let output = build_portable(logger, &options)?;

    info!(
        logger,
        "Portable build created at {}",
        output.executable.display()
    );
    if let Some(archive) = &output.archive {
        info!(logger, "Portable archive written to {}", archive.display());
    }

    Ok(())
}

fn command_print_command(args: &ArgMatches) -> Result<()> {
    let options = build_options(args)?;
    let python = resolve_python(options.python.as_deref())?;

    println!("{}", options.packaging_command(python).display());

    Ok(())
}

pub fn run_cli() -> Result<()> {
    let app = Command::new("ocr-portable")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build portable Windows distributions of the Ollama OCR application")
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        );

    let app = app.subcommand(add_selection_args(
        Command::new("build")
            .about("Build the portable distribution")
            .long_about(BUILD_ABOUT)
            .arg(
                Arg::new("skip_install")
                    .long("skip-install")
                    .action(ArgAction::SetTrue)
                    .help("Do not check for or install PyInstaller"),
            )
            .arg(
                Arg::new("no_archive")
                    .long("no-archive")
                    .action(ArgAction::SetTrue)
                    .help("Do not zip the bundle"),
            ),
    ));

    let app = app.subcommand(add_selection_args(
        Command::new("print-command")
            .about("Print the PyInstaller command without running it")
            .long_about(PRINT_COMMAND_ABOUT),
    ));

    let matches = app.get_matches();

    let logger_context = logging::logger_from_settings(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("build", args)) => command_build(&logger_context.logger, args),
        Some(("print-command", args)) => command_print_command(args),
        _ => Err(anyhow!("invalid sub-command")),
    }
}
