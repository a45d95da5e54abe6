//! Command dispatcher: resolves settings, loads the workbook through the
//! cache and routes each command to its view and formatter.

use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use tracing::info;

use crate::cli::formatters::{
    format_annual, format_dimensions, format_evolution, format_json, format_monthly,
    format_positions, format_view,
};
use crate::cli::{Cli, Commands, DimensionTable};
use crate::config::{Settings, WORKBOOK_ENV};
use crate::engine::View;
use crate::loader::{SourceCache, WorkbookLoader};
use crate::reports::{
    annual_report, build_evolution, evolution_dimensions, monthly_report, position_dimensions,
    positions_report, EvolutionSelection, PositionSelection,
};

/// Resolve settings for this invocation: flag > env > config file > default
pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(settings.with_overrides(env::var(WORKBOOK_ENV).ok(), cli.workbook.clone()))
}

/// Run one parsed command line and print its output
pub fn dispatch(cli: &Cli) -> Result<()> {
    let settings = resolve_settings(cli)?;
    let mut cache = SourceCache::new();
    let output = render(&cli.command, &settings, &mut cache, cli.json)?;
    print!("{}", output);
    Ok(())
}

/// Produce the text (or JSON) output of `command`
pub fn render(
    command: &Commands,
    settings: &Settings,
    cache: &mut SourceCache,
    json_output: bool,
) -> Result<String> {
    if !settings.workbook.exists() {
        anyhow::bail!(
            "Workbook not found: {}\nPass --workbook <path>, set {} or add `workbook` to the config file.",
            settings.workbook.display(),
            WORKBOOK_ENV
        );
    }

    let loader = WorkbookLoader::new(&settings.workbook, settings.sheets.clone());
    let dataset = cache
        .get_or_load(&loader)
        .with_context(|| format!("Failed to load workbook {}", settings.workbook.display()))?;

    match command {
        Commands::Monthly => {
            info!("Rendering monthly performance");
            emit(&monthly_report(&dataset.monthly), json_output, format_monthly)
        }

        Commands::Annual => {
            info!("Rendering annual performance");
            emit(&annual_report(&dataset.annual), json_output, format_annual)
        }

        Commands::Evolution {
            tipo,
            categoria,
            alocacao,
            all_allocations,
        } => {
            info!("Rendering allocation evolution");
            let selection = EvolutionSelection {
                tipo: tipo.clone(),
                categoria: categoria.clone(),
                alocacao: alocacao.clone(),
                all_allocations: *all_allocations,
            };
            let view = build_evolution(
                &dataset.historical,
                &selection,
                settings.default_allocations,
            );
            emit(&view, json_output, format_evolution)
        }

        Commands::Positions {
            tipo,
            classe,
            setor,
            search,
            top,
        } => {
            info!("Rendering current positions");
            let selection = PositionSelection {
                tipo: tipo.clone(),
                classe: classe.clone(),
                setor: setor.clone(),
                search: search.clone(),
            };
            let view = positions_report(
                &dataset.positions,
                &selection.to_filter(),
                top.unwrap_or(settings.top_n),
            );
            emit(&view, json_output, format_positions)
        }

        Commands::Dimensions { table } => {
            let dimensions = match table {
                DimensionTable::Evolution => {
                    evolution_dimensions(&dataset.historical, settings.default_allocations)
                }
                DimensionTable::Positions => position_dimensions(&dataset.positions),
            };
            if json_output {
                Ok(format!("{}\n", format_json(&dimensions)?))
            } else {
                Ok(format_dimensions(&dimensions))
            }
        }
    }
}

fn emit<T: Serialize>(
    view: &View<T>,
    json_output: bool,
    render: impl Fn(&T) -> String,
) -> Result<String> {
    if json_output {
        Ok(format!("{}\n", format_json(view)?))
    } else {
        Ok(format_view(view, render))
    }
}
