//! Payment link check

use anyhow::Result;
use bookprobe_common::PaymentMethod;
use bookprobe_e2e::notify;
use bookprobe_e2e::payment::{PaymentProbe, PaymentTiming};
use bookprobe_e2e::ProbeConfig;
use clap::Args;

use super::BrowserSession;
use crate::output::{print_document, print_info, OutputFormat};

pub const USAGE: &str = "\
Usage: bookprobe payment [options] <payment_link> <payment_method>

Options:
  --link <url>     Payment link URL
  --method <name>  Payment method (credit_card, ideal, debit_card, bank_transfer)

Examples:
  bookprobe payment \"https://payments.example.com/invoice/project/PROJ-1137?sign=xxx\" credit_card
  bookprobe payment --link \"https://payments.example.com/invoice/project/PROJ-1137?sign=xxx\" --method ideal
";

#[derive(Args, Debug, Default)]
pub struct PaymentArgs {
    /// Payment link, then payment method
    #[arg(num_args = 0..=2, value_name = "ARG")]
    pub positional: Vec<String>,

    /// Payment link URL
    #[arg(long)]
    pub link: Option<String>,

    /// Payment method
    #[arg(long)]
    pub method: Option<String>,
}

impl PaymentArgs {
    /// Flags win; positionals fill what is still missing, link first
    pub fn resolve(&self) -> Option<(String, String)> {
        let mut link = self.link.clone().filter(|s| !s.is_empty());
        let mut method = self.method.clone().filter(|s| !s.is_empty());
        for arg in self.positional.iter().filter(|s| !s.is_empty()) {
            if link.is_none() {
                link = Some(arg.clone());
            } else if method.is_none() {
                method = Some(arg.clone());
            }
        }
        Some((link?, method?))
    }
}

/// `Ok(false)` on a failed probe or missing arguments
pub async fn execute(args: PaymentArgs, config: &ProbeConfig, format: OutputFormat) -> Result<bool> {
    let Some((link, method)) = args.resolve() else {
        println!("{}", USAGE);
        return Ok(false);
    };
    // before the browser starts
    let method: PaymentMethod = method.parse()?;

    let notifier = notify::from_config(&config.notify)?;
    print_info(&format!("Starting payment test: {}", method));

    let session = BrowserSession::launch(config).await?;
    let timing = PaymentTiming {
        navigation: config.timeouts.navigation(),
        ..Default::default()
    };
    let report = PaymentProbe::new(session.page(), notifier.as_ref())
        .with_timing(timing)
        .run(&link, method)
        .await;
    session.close().await;

    print_document(&report, format);
    Ok(report.success)
}
