// Copyright 2026 Sizeguide Contributors
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use sizeguide_runtime::cli;

#[derive(Parser)]
#[command(
    name = "sizeguide",
    about = "Sizeguide: collect a shoe brand's products and size guides into a spreadsheet",
    version,
    after_help = "Example: sizeguide https://www.kleman-france.com\nEnvironment: SIZEGUIDE_OUTPUT_DIR, SIZEGUIDE_CHROMIUM_PATH, SIZEGUIDE_HTTP_ONLY, RUST_LOG"
)]
struct Cli {
    /// Website to scrape; the scheme is optional
    url: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sizeguide=info".parse().expect("static directive")),
        )
        .init();

    let Some(url) = cli.url else {
        eprintln!("Usage: sizeguide <website-url>");
        eprintln!("Example: sizeguide https://www.kleman-france.com");
        std::process::exit(1);
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = cli::scrape_cmd::run(&url).await {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }
}
