//! Appointment flows

use anyhow::Result;
use bookprobe_common::generate::consistent_record;
use bookprobe_e2e::wizard::{AppointmentData, WizardData};
use bookprobe_e2e::{AppointmentFlow, ProbeConfig, TestAppointmentWizard};
use clap::Args;

use super::BrowserSession;
use crate::output::{print_document, print_pairs, print_success, OutputFormat};

#[derive(Args, Debug)]
pub struct AppointmentArgs {
    /// Drive the multi-page test-appointment wizard instead of the short form
    #[arg(long)]
    pub wizard: bool,

    /// Book a repair instead of a diagnosis (wizard only)
    #[arg(long, requires = "wizard")]
    pub repair: bool,

    /// Derive the vehicle data from this seed
    #[arg(long)]
    pub seed: Option<String>,
}

pub async fn execute(args: AppointmentArgs, config: &ProbeConfig, format: OutputFormat) -> Result<bool> {
    let record = args.seed.as_deref().map(consistent_record);
    let session = BrowserSession::launch(config).await?;

    let result = if args.wizard {
        let mut data = if args.repair {
            WizardData::repair()
        } else {
            WizardData::default()
        };
        if let Some(record) = &record {
            data = WizardData {
                job: data.job,
                calendar_day: data.calendar_day,
                sounds: data.sounds,
                ..WizardData::from_record(record)
            };
        }
        TestAppointmentWizard::new(session.page(), config).run(&data).await
    } else {
        let data = record
            .as_ref()
            .map(AppointmentData::from_record)
            .unwrap_or_default();
        AppointmentFlow::new(session.page(), config).run(&data).await
    };
    session.close().await;
    let report = result?;

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_document(&report, format),
        _ => {
            print_pairs(
                &[
                    ("Flow", report.flow.clone()),
                    ("Steps", report.steps.join(" > ")),
                    ("Overlays closed", report.overlays_closed.to_string()),
                    ("Final URL", report.final_url.clone().unwrap_or_default()),
                ],
                format,
            );
            print_success(&format!("{} completed", report.flow));
        }
    }
    Ok(true)
}
