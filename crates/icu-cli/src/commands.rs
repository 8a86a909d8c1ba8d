use anyhow::Result;
use comfy_table::Table;
use tracing::info_span;

use icu_cli::config::{ConfigFile, Overrides, PipelineConfig};
use icu_cli::pipeline::{PipelineResult, run_pipeline};

use crate::cli::{BuildArgs, SignalsArgs};
use crate::summary::apply_table_style;

pub fn run_build(args: &BuildArgs) -> Result<PipelineResult> {
    let file = args.config.as_deref().map(ConfigFile::load).transpose()?;
    let overrides = Overrides {
        input_dir: args.input_dir.clone(),
        output_file: args.output.clone(),
        window_hours: args.window_hours,
        signals: args.signals.clone(),
        dry_run: args.dry_run,
    };
    let config = PipelineConfig::resolve(file.as_ref(), overrides)?;
    let _span = info_span!("build", output = %config.output_file.display()).entered();
    run_pipeline(&config)
}

pub fn run_signals(args: &SignalsArgs) -> Result<()> {
    let file = args.config.as_deref().map(ConfigFile::load).transpose()?;
    let config = PipelineConfig::resolve(file.as_ref(), Overrides::default())?;
    let mut table = Table::new();
    table.set_header(vec!["Item", "Signal", "Columns"]);
    apply_table_style(&mut table);
    for signal in config.dictionary.signals() {
        table.add_row(vec![
            signal.code.to_string(),
            signal.name.clone(),
            format!("{}, {}", signal.mean_column(), signal.max_column()),
        ]);
    }
    println!("{table}");
    println!("Window: {} h from admission", config.window.hours());
    Ok(())
}
