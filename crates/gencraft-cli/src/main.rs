//! GenCraft CLI
//!
//! The `gencraft` command turns a one-line project idea into a plan, a
//! flowchart or strategic advice, starter code, a UI mockup and insights.
//!
//! ## Commands
//!
//! - `craft`: run the generation pipeline against Gemini
//! - `prompt`: render a stage prompt offline

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gencraft_core::template::{
    self, FIELD_FLOWCHART, FIELD_GENERATED_CODE, FIELD_PROJECT_IDEA, FIELD_PROJECT_INSIGHTS,
    FIELD_PROJECT_PLAN, FIELD_STRATEGIC_ADVICE,
};
use gencraft_core::{PromptFields, StageKind, TemplateId};
use gencraft_gemini::{GeminiBackend, GeminiConfig};
use gencraft_pipeline::{
    export_outcome, GenerationPipeline, Notification, NotificationLevel, PipelineOptions,
    PipelineOutcome, PipelineVariant, StatusLabel,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "gencraft")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn a project idea into a plan, flowchart, starter code and more", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the generation pipeline for an idea
    Craft {
        /// The project idea, e.g. "A recipe sharing app for students"
        idea: String,

        /// Stage ordering: flowchart-first or advice-first
        #[arg(long, default_value = "flowchart-first")]
        variant: PipelineVariant,

        /// Finish with a strategic review of the plan, code and insights
        #[arg(long)]
        closing_review: bool,

        /// Also generate a light theme palette
        #[arg(long)]
        theme: bool,

        /// Write all artifacts and a run report to this directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Model for structured stages
        #[arg(long, env = "GENCRAFT_TEXT_MODEL")]
        text_model: Option<String>,

        /// Model for the conceptual image stage
        #[arg(long, env = "GENCRAFT_IMAGE_MODEL")]
        image_model: Option<String>,
    },

    /// Render a stage prompt without calling any model
    Prompt {
        /// Template name: plan, flowchart, code, code-from-advice, image,
        /// insights, advice, review or theme
        template: TemplateId,

        /// Project idea
        #[arg(long)]
        idea: String,

        /// Project plan text
        #[arg(long)]
        plan: Option<String>,

        /// Flowchart SVG
        #[arg(long)]
        flowchart: Option<String>,

        /// Strategic advice text
        #[arg(long)]
        advice: Option<String>,

        /// Generated code
        #[arg(long)]
        code: Option<String>,

        /// Project insights text
        #[arg(long)]
        insights: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    gencraft_core::telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Craft {
            idea,
            variant,
            closing_review,
            theme,
            out,
            text_model,
            image_model,
        } => {
            let options = PipelineOptions::new(variant)
                .with_closing_review(closing_review)
                .with_theme(theme);
            let mut config =
                GeminiConfig::from_env().context("Failed to configure the Gemini backend")?;
            if let Some(model) = text_model {
                config.text_model = model;
            }
            if let Some(model) = image_model {
                config.image_model = model;
            }
            cmd_craft(config, options, &idea, out).await
        }
        Commands::Prompt {
            template,
            idea,
            plan,
            flowchart,
            advice,
            code,
            insights,
        } => {
            let mut fields = PromptFields::new();
            fields.insert(FIELD_PROJECT_IDEA.to_string(), idea);
            for (name, value) in [
                (FIELD_PROJECT_PLAN, plan),
                (FIELD_FLOWCHART, flowchart),
                (FIELD_STRATEGIC_ADVICE, advice),
                (FIELD_GENERATED_CODE, code),
                (FIELD_PROJECT_INSIGHTS, insights),
            ] {
                if let Some(value) = value {
                    fields.insert(name.to_string(), value);
                }
            }
            cmd_prompt(template, &fields)
        }
    }
}

async fn cmd_craft(
    config: GeminiConfig,
    options: PipelineOptions,
    idea: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let backend = GeminiBackend::new(config).context("Failed to build the HTTP client")?;
    let pipeline = GenerationPipeline::new(Arc::new(backend), options);
    let mut notifications = pipeline.subscribe();

    println!("Crafting ({}): {}", options.variant, idea);
    println!();

    let run = pipeline.submit(idea);
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            received = notifications.recv() => match received {
                Ok(notification) => print_notification(&notification),
                Err(RecvError::Lagged(missed)) => {
                    info!(missed, "Notification stream lagged");
                }
                Err(RecvError::Closed) => {}
            },
        }
    };
    while let Ok(notification) = notifications.try_recv() {
        print_notification(&notification);
    }

    let outcome = result.context("Generation run did not start")?;
    print_summary(&outcome);

    if let Some(dir) = out {
        let written = export_outcome(&outcome, &dir)
            .with_context(|| format!("Failed to export artifacts to {}", dir.display()))?;
        println!();
        println!("Wrote {} files to {}", written.len(), dir.display());
    }

    if outcome.completed() {
        Ok(())
    } else {
        anyhow::bail!("Run halted: the required stage could not produce a usable result")
    }
}

fn cmd_prompt(template: TemplateId, fields: &PromptFields) -> Result<()> {
    let prompt = template::build(template, fields)
        .with_context(|| format!("Failed to render the {template} prompt"))?;
    println!("{prompt}");
    Ok(())
}

fn print_notification(notification: &Notification) {
    let marker = match notification.level {
        NotificationLevel::Success => "✓",
        NotificationLevel::Failure => "✗",
        NotificationLevel::Note => "!",
    };
    if notification.description.is_empty() {
        println!("{} {}", marker, notification.title);
    } else {
        println!(
            "{} {}: {}",
            marker, notification.title, notification.description
        );
    }
}

fn print_summary(outcome: &PipelineOutcome) {
    println!();
    println!("Run ID: {}", outcome.spec.run_id);
    println!("Variant: {}", outcome.spec.variant);
    match outcome.halted_at {
        None => println!("Status: ✓ COMPLETED"),
        Some(stage) => println!("Status: ✗ HALTED at {}", stage),
    }
    println!("Duration: {}ms", outcome.duration_ms);
    println!();

    for (stage, label) in outcome.state.summary() {
        let marker = match label {
            StatusLabel::Succeeded => "✓",
            StatusLabel::FailedFallback => "✗",
            StatusLabel::Skipped => "-",
            StatusLabel::Pending | StatusLabel::Running => "?",
        };
        println!("  {} {:<9} {}", marker, stage.name(), label);
    }

    if let Some(plan) = outcome.state.plan.usable_output() {
        println!();
        println!("{}:", StageKind::Plan.title());
        for (i, milestone) in plan.milestones().iter().enumerate() {
            println!("  {}. {}", i + 1, milestone);
        }
    }
    if let Some(code) = outcome.state.code.usable_output() {
        println!();
        println!("{}:", StageKind::Code.title());
        for file in &code.files {
            println!("  {}", file.file_name);
        }
    }
    if let Some(insights) = outcome.state.insights.usable_output() {
        println!();
        println!("{}:", StageKind::Insights.title());
        println!("  Complexity: {}", insights.estimated_complexity);
        println!("  Keywords: {}", insights.suggested_keywords.join(", "));
        println!("  Tip: {}", insights.fun_fact_or_tip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_craft_args() {
        let cli = Cli::try_parse_from([
            "gencraft",
            "craft",
            "A recipe app",
            "--variant",
            "advice-first",
            "--closing-review",
            "--out",
            "out",
        ])
        .unwrap();

        match cli.command {
            Commands::Craft {
                idea,
                variant,
                closing_review,
                theme,
                out,
                ..
            } => {
                assert_eq!(idea, "A recipe app");
                assert_eq!(variant, PipelineVariant::AdviceFirst);
                assert!(closing_review);
                assert!(!theme);
                assert_eq!(out, Some(PathBuf::from("out")));
            }
            Commands::Prompt { .. } => panic!("expected craft"),
        }
    }

    #[test]
    fn test_prompt_rejects_unknown_template() {
        assert!(Cli::try_parse_from(["gencraft", "prompt", "poem", "--idea", "x"]).is_err());
    }

    #[test]
    fn test_prompt_renders_offline() {
        let mut fields = PromptFields::new();
        fields.insert(FIELD_PROJECT_IDEA.to_string(), "A recipe app".to_string());
        assert!(cmd_prompt(TemplateId::Plan, &fields).is_ok());
        assert!(cmd_prompt(TemplateId::Review, &fields).is_err());
    }
}
