//! `duka template`: the product import template.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use duka_core::import::template_csv;

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: TemplateArgs) -> anyhow::Result<()> {
    let template = template_csv();

    match args.output {
        Some(path) => {
            std::fs::write(&path, template)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Template written to {}", path.display());
        }
        None => print!("{}", template),
    }

    Ok(())
}
