//! Prompt Assembler CLI - Bridge interface
//!
//! Commands: assemble, matrix, compose, tenner, tenner32, individual-tenners,
//! chunks, catalog, convert-tenners
//! Writes pretty JSON files, prints a JSON summary to stdout, logs to stderr.
//! Exit status: 0 on success, 2 when every item failed, 1 on setup errors.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prompt_assembler_core::{
    chunk::{load_definitions, select_definitions},
    tenner::{load_tenner32, select_permutation, split_into_tables, write_tables},
    AssemblyPipeline, AssemblySelection, AssetFilter, BatchReport, BundleWriter, CatalogBuilder,
    Category, ChunkId, EngineConfig, EngineError, SkeletonRegistry, TennerGenerator, TennerNumber,
    TennerSet,
};

#[derive(Parser)]
#[command(name = "pa-cli")]
#[command(about = "Prompt Assembler CLI - Bundle Assembly Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root; relative config paths resolve against it
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// JSON config file, relative to the root
    #[arg(short, long, default_value = "pa.json")]
    config: PathBuf,

    /// Output directory, relative to the root
    #[arg(short, long, default_value = "bundles")]
    output_dir: PathBuf,

    /// Tag every bundle with a fresh run id
    #[arg(long)]
    run_id: bool,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble bundles from a directory of spec files, or from the
    /// filtered store when no directory is given
    Assemble {
        #[arg(long)]
        specs: Option<PathBuf>,
        #[arg(long, default_value = "all")]
        characters: String,
        #[arg(long, default_value = "all")]
        poses: String,
        #[arg(long, default_value = "all")]
        scenes: String,
        /// `none`, `all`, or ids; kept per pose when compatible
        #[arg(long, default_value = "none")]
        wardrobe: String,
    },

    /// Cartesian product over store categories
    Matrix {
        #[arg(long, value_delimiter = ',', default_value = "characters,poses,scenes")]
        axes: Vec<String>,
    },

    /// Write spec stubs for every filtered combination
    Compose {
        #[arg(long, default_value = "all")]
        characters: String,
        #[arg(long, default_value = "all")]
        poses: String,
        #[arg(long, default_value = "all")]
        orientations: String,
        #[arg(long, default_value = "all")]
        scenes: String,
        #[arg(long, default_value = "none")]
        wardrobe: String,
        #[arg(long, default_value = "all")]
        lighting: String,
        #[arg(long, default_value = "all")]
        models: String,
    },

    /// Mixed-radix permutations over Tenner categories
    Tenner {
        #[arg(long, value_delimiter = ',', default_value = "character,headwear")]
        categories: Vec<String>,

        /// Stop after this many permutations
        #[arg(long)]
        limit: Option<u64>,
    },

    /// One bundle from a complete 32-Tenner option
    Tenner32 {
        #[arg(long, default_value_t = 0)]
        permutation: usize,
    },

    /// One bundle per entry of each numbered Tenner
    IndividualTenners {
        #[arg(long, value_delimiter = ',', default_value = "1")]
        tenners: Vec<String>,
    },

    /// Every combination of the selected chunks
    Chunks {
        #[arg(long, value_delimiter = ',', default_value = "1")]
        chunks: Vec<u32>,
    },

    /// Catalog of every defined chunk plus summary
    Catalog {
        /// Also write chunk_catalog.csv
        #[arg(long)]
        csv: bool,
    },

    /// Split the 32-Tenner source into numbered Tenner tables
    ConvertTenners,
}

/// What a command reports back.
struct Outcome {
    summary: serde_json::Value,
    all_failed: bool,
}

impl Outcome {
    fn from_report(report: &BatchReport) -> Result<Self, EngineError> {
        Ok(Self {
            summary: serde_json::to_value(report.summary())?,
            all_failed: report.all_failed(),
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(outcome) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome.summary).unwrap_or_default()
            );
            if outcome.all_failed {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            let output = json!({ "success": false, "error": e.to_string() });
            println!("{}", output);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, EngineError> {
    let config = EngineConfig::load(&cli.root.join(&cli.config))?.resolve(&cli.root);
    let output_dir = cli.root.join(&cli.output_dir);

    let mut pipeline = AssemblyPipeline::from_config(&config)?;
    if cli.run_id {
        let factory = pipeline.factory().clone().with_run_id();
        pipeline = pipeline.with_factory(factory);
    }

    match cli.command {
        Commands::Assemble {
            specs: Some(specs),
            ..
        } => {
            let specs = cli.root.join(specs);
            if !specs.is_dir() {
                return Err(EngineError::missing_source("specs", specs));
            }
            let mut writer = BundleWriter::create(&output_dir)?;
            let report = pipeline.assemble_spec_dir(&specs, &mut writer)?;
            Outcome::from_report(&report)
        }

        Commands::Assemble {
            specs: None,
            characters,
            poses,
            scenes,
            wardrobe,
        } => {
            let selection = AssemblySelection {
                characters: characters.parse()?,
                poses: poses.parse()?,
                scenes: scenes.parse()?,
                wardrobe: wardrobe.parse()?,
            };
            let mut writer = BundleWriter::create(&output_dir)?;
            let report = pipeline.assemble_selection(&selection, &mut writer);
            Outcome::from_report(&report)
        }

        Commands::Matrix { axes } => {
            let axes = axes
                .iter()
                .map(|a| {
                    Category::parse(a)
                        .ok_or_else(|| EngineError::Config(format!("unknown matrix axis '{}'", a)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let mut writer = BundleWriter::create(&output_dir)?;
            let report = pipeline.assemble_matrix(&axes, &mut writer);
            Outcome::from_report(&report)
        }

        Commands::Compose {
            characters,
            poses,
            orientations,
            scenes,
            wardrobe,
            lighting,
            models,
        } => {
            let filters = [
                (Category::Characters, characters),
                (Category::Poses, poses),
                (Category::Orientations, orientations),
                (Category::Scenes, scenes),
                (Category::Wardrobe, wardrobe),
                (Category::Lighting, lighting),
                (Category::Models, models),
            ]
            .into_iter()
            .map(|(c, raw)| raw.parse::<AssetFilter>().map(|f| (c, f)))
            .collect::<Result<Vec<_>, _>>()?;

            let envelopes = pipeline.compose_specs(&filters);
            fs::create_dir_all(&output_dir)?;
            for envelope in &envelopes {
                fs::write(
                    output_dir.join(envelope.file_name()),
                    serde_json::to_string_pretty(envelope)?,
                )?;
            }
            info!(specs = envelopes.len(), "composed spec stubs");
            Ok(Outcome {
                summary: json!({ "converted": envelopes.len(), "errors": 0 }),
                all_failed: false,
            })
        }

        Commands::Tenner { categories, limit } => {
            let names: Vec<&str> = categories.iter().map(|c| c.trim()).collect();
            let set = TennerSet::load(&config.data_dir, &names)?;
            let generator = TennerGenerator::new(set)?;
            let mut writer = BundleWriter::create(&output_dir)?;
            let report = pipeline.generate_tenner(&generator, limit, &mut writer);
            Outcome::from_report(&report)
        }

        Commands::Tenner32 { permutation } => {
            let options = load_tenner32(&config.tenner32_path)?;
            let option = select_permutation(&options, permutation)?;
            let mut writer = BundleWriter::create(&output_dir)?;
            let mut report = BatchReport::default();
            report.record(
                format!("permutation {}", permutation),
                option.to_bundle(
                    permutation,
                    pipeline.composer(),
                    pipeline.factory(),
                    &pipeline.context(),
                ),
                &mut writer,
            );
            Outcome::from_report(&report)
        }

        Commands::IndividualTenners { tenners } => {
            let numbers = tenners
                .iter()
                .map(|t| t.parse::<TennerNumber>())
                .collect::<Result<Vec<_>, _>>()?;
            let mut writer = BundleWriter::create(&output_dir)?;
            let report = pipeline.generate_individual_tenners(&numbers, &config.tenner_dir, &mut writer);
            Outcome::from_report(&report)
        }

        Commands::Chunks { chunks } => {
            let definitions = load_definitions(&config.chunks_path)?;
            let skeletons = SkeletonRegistry::load_from_file(&config.skeletons_path)?;
            let ids: Vec<ChunkId> = chunks.into_iter().map(ChunkId).collect();
            let (selected, missing) = select_definitions(&definitions, &ids);

            let mut report = BatchReport::default();
            for id in missing {
                report.fail(id.to_string(), &EngineError::InvalidChunkId(format!("{} not defined", id)));
            }
            let mut writer = BundleWriter::create(&output_dir)?;
            report.merge(pipeline.generate_chunks(&selected, &config.tenner_dir, &skeletons, &mut writer));
            Outcome::from_report(&report)
        }

        Commands::Catalog { csv } => {
            let definitions = load_definitions(&config.chunks_path)?;
            let skeletons = SkeletonRegistry::load_from_file(&config.skeletons_path)?;
            let catalog = CatalogBuilder::new(
                &config.tenner_dir,
                &skeletons,
                pipeline.composer(),
                pipeline.factory(),
                pipeline.context(),
            )
            .build(&definitions);
            let summary = catalog.summary();

            fs::create_dir_all(&output_dir)?;
            fs::write(
                output_dir.join("chunk_catalog.json"),
                serde_json::to_string_pretty(&catalog)?,
            )?;
            fs::write(
                output_dir.join("catalog_summary.json"),
                serde_json::to_string_pretty(&summary)?,
            )?;
            if csv {
                catalog.write_csv(&output_dir.join("chunk_catalog.csv"))?;
            }

            let all_failed = !definitions.is_empty() && summary.failed_chunks.len() == definitions.len();
            Ok(Outcome {
                summary: json!({
                    "converted": summary.total_combinations,
                    "errors": summary.failed_chunks.len(),
                    "summary": summary,
                }),
                all_failed,
            })
        }

        Commands::ConvertTenners => {
            let options = load_tenner32(&config.tenner32_path)?;
            let tables = split_into_tables(&options);
            let written = write_tables(&config.tenner_dir, &tables)?;
            Ok(Outcome {
                summary: json!({ "converted": written, "errors": 0 }),
                all_failed: false,
            })
        }
    }
}
