mod sample;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use formguard::observable::Observable;
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use sample::{SampleForm, SampleOptions};

/// Form Validation 101: drives the sample form through a short scripted
/// session and prints the form after each step.
#[derive(Debug, Parser)]
#[command(name = "formguard-demo", version, about)]
struct Cli {
    /// Don't render error lines under the fields.
    #[arg(long)]
    hide_errors: bool,

    /// Don't validate the form when focus leaves an input.
    #[arg(long)]
    no_validate_on_blur: bool,

    /// Don't revalidate Name and Phone while they are edited.
    #[arg(long)]
    no_validate_on_change: bool,

    /// Duration of the asynchronous terms-of-service check.
    #[arg(long, default_value_t = 100)]
    terms_delay_ms: u64,

    /// Tick the terms-of-service box before the first submit.
    #[arg(long)]
    agree: bool,

    /// Where to write the debug log.
    #[arg(long, default_value = "formguard-demo.log")]
    log_file: PathBuf,
}

impl Cli {
    fn sample_options(&self) -> SampleOptions {
        SampleOptions {
            show_errors: !self.hide_errors,
            validate_on_blur: Observable::new(!self.no_validate_on_blur),
            validate_on_change: !self.no_validate_on_change,
            terms_delay: Duration::from_millis(self.terms_delay_ms),
        }
    }
}

fn init_logging(path: &Path) -> std::io::Result<()> {
    let log_file = File::create(path)?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .map_err(std::io::Error::other)
}

/// Let pending change-driven passes settle.
async fn settle(options: &SampleOptions) {
    tokio::time::sleep(options.terms_delay + Duration::from_millis(20)).await;
}

async fn run(cli: Cli) {
    let options = cli.sample_options();
    let sample = SampleForm::new(&options);

    println!("Form Validation 101\n");

    sample.form.mount().await;
    println!("After mount:\n{}", sample.render());

    if cli.agree {
        sample.agree.set(true);
        sample.form.blur().await;
        settle(&options).await;
    }

    match sample.submit() {
        Some(_) => println!("Submitted.\n"),
        None => println!("Submit blocked.\n"),
    }

    sample.agree.set(true);
    if !sample.form.blur().await {
        info!("Validate on blur is off, waiting for change validation");
    }
    settle(&options).await;
    println!("After agreeing to the terms:\n{}", sample.render());

    match sample.submit() {
        Some(data) => println!("Submitted {:?}\n", data),
        None => println!("Submit blocked.\n"),
    }

    sample.clear();
    sample.form.blur().await;
    settle(&options).await;
    println!("After clear:\n{}", sample.render());
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_file) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    run(cli).await;
    ExitCode::SUCCESS
}
