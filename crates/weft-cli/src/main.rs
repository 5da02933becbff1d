mod classes;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use weft_classfile::opcodes;
use weft_config::WeftConfig;
use weft_core::{ClassName, Diagnostic, Severity};
use weft_mappings::{MappingService, MappingVersion, SrgFileSource};
use weft_mixin::{
    AtCode, Candidate, FailureReason, InjectionPoint, MixinDeclaration, Mode, ResolutionOutcome, ResolveOptions,
    Resolver,
};

#[derive(Parser)]
#[command(name = "weft", version, about = "Weft CLI (mixin target resolution)")]
struct Cli {
    /// Config file (defaults to `weft.toml` or `.weft/config.toml` in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a selector to the members it designates
    Resolve(SelectorArgs),
    /// List candidates for a selector being written
    Complete(CompleteArgs),
    /// Report whether a selector resolves
    Check(SelectorArgs),
}

#[derive(Args)]
struct DeclarationArgs {
    /// Directory of compiled classes
    #[arg(long)]
    classes: PathBuf,
    /// Target class of the mixin (repeatable)
    #[arg(long = "target", required = true)]
    targets: Vec<String>,
    /// Injector target method selector (repeatable)
    #[arg(long = "method")]
    methods: Vec<String>,
    /// Injection point type (INVOKE, INVOKE_ASSIGN, FIELD, NEW, INVOKE_STRING)
    #[arg(long)]
    at: Option<String>,
    /// Injection point argument as `key=value` (repeatable)
    #[arg(long = "arg")]
    args: Vec<String>,
    /// Keep only the n-th match in each target method
    #[arg(long)]
    ordinal: Option<usize>,
    /// Keep only matches with this opcode, e.g. `GETFIELD`
    #[arg(long)]
    opcode: Option<String>,
    /// The selector names a field rather than a method
    #[arg(long, conflicts_with = "at")]
    field: bool,
    /// Mapping version to use instead of the configured one
    #[arg(long)]
    mappings_version: Option<String>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SelectorArgs {
    #[command(flatten)]
    declaration: DeclarationArgs,
    /// Member selector, e.g. `Lpkg/Owner;name(I)V`
    selector: String,
}

#[derive(Args)]
struct CompleteArgs {
    #[command(flatten)]
    declaration: DeclarationArgs,
    /// Text typed so far
    #[arg(default_value = "")]
    prefix: String,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let (config, config_path) = load_config(cli.config.as_deref())?;
    weft_config::init_tracing(&config.logging);

    match cli.command {
        Command::Resolve(args) => {
            let session = Session::open(&config, config_path.as_deref(), &args.declaration)?;
            let resolver = session.resolver();
            let outcome = resolver.resolve(&args.selector, &session.declaration, Mode::Exact)?;
            let exit = if outcome.is_resolved() { 0 } else { 1 };
            if args.declaration.json {
                print_json(&outcome)?;
            } else {
                print_outcome(&outcome);
            }
            Ok(exit)
        }
        Command::Complete(args) => {
            let session = Session::open(&config, config_path.as_deref(), &args.declaration)?;
            let candidates = session.resolver().complete(&session.declaration, &args.prefix)?;
            if args.declaration.json {
                print_json(&candidates)?;
            } else {
                print_candidates(&candidates);
            }
            Ok(0)
        }
        Command::Check(args) => {
            let session = Session::open(&config, config_path.as_deref(), &args.declaration)?;
            let diagnostic = session.resolver().check(&args.selector, &session.declaration);
            let failed = diagnostic.as_ref().is_some_and(|d| d.severity == Severity::Error);
            let exit = if failed { 1 } else { 0 };
            if args.declaration.json {
                print_json(&CheckReport {
                    ok: !failed,
                    diagnostic: diagnostic.as_ref(),
                })?;
            } else {
                match &diagnostic {
                    Some(diagnostic) => println!("{diagnostic}"),
                    None => println!("ok"),
                }
            }
            Ok(exit)
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<(WeftConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => {
            let config = WeftConfig::load_from_path(path)?;
            Ok((config, Some(path.to_path_buf())))
        }
        None => {
            let cwd = std::env::current_dir().context("failed to determine current directory")?;
            Ok(weft_config::load_for_root(&cwd)?)
        }
    }
}

/// Everything a command needs: class models, mappings and the declaration
/// described on the command line.
struct Session {
    models: weft_mixin::InMemoryClassModels,
    mappings: Arc<MappingService>,
    version: Option<MappingVersion>,
    options: ResolveOptions,
    declaration: MixinDeclaration,
}

impl Session {
    fn open(config: &WeftConfig, config_path: Option<&Path>, args: &DeclarationArgs) -> Result<Self> {
        let declaration = declaration(args)?;
        let models = classes::load_classes(&args.classes)?;

        let config_dir = config_path
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut source = SrgFileSource::new();
        for (version, path) in config.mappings.resolved_tables(&config_dir) {
            source.insert(&version, path);
        }

        let version = args
            .mappings_version
            .as_deref()
            .or(config.mappings.version.as_deref())
            .map(MappingVersion::from);

        Ok(Self {
            models,
            mappings: Arc::new(MappingService::new(source)),
            version,
            options: ResolveOptions {
                optimistic_string_completion: config.resolve.optimistic_string_completion,
                navigate_source: config.resolve.navigate_source,
                max_candidates: config.resolve.max_candidates,
            },
            declaration,
        })
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.models, Arc::clone(&self.mappings))
            .with_version(self.version.clone())
            .with_options(self.options.clone())
    }
}

fn declaration(args: &DeclarationArgs) -> Result<MixinDeclaration> {
    let targets: Vec<ClassName> = args.targets.iter().map(ClassName::new).collect();
    let injection = args.at.is_some()
        || !args.methods.is_empty()
        || !args.args.is_empty()
        || args.ordinal.is_some()
        || args.opcode.is_some();

    if !injection {
        return Ok(if args.field {
            MixinDeclaration::field("cli", targets)
        } else {
            MixinDeclaration::method("cli", targets)
        });
    }

    let code = match &args.at {
        Some(text) => Some(AtCode::parse(text).with_context(|| format!("unknown injection point type `{text}`"))?),
        None => None,
    };
    let mut point = InjectionPoint::new(code);
    for method in &args.methods {
        point = point.in_method(method.as_str());
    }
    for arg in &args.args {
        let (key, value) = arg
            .split_once('=')
            .with_context(|| format!("injection point argument `{arg}` is not `key=value`"))?;
        point = point.arg(key.trim(), value.trim());
    }
    if let Some(ordinal) = args.ordinal {
        point = point.ordinal(ordinal);
    }
    if let Some(name) = &args.opcode {
        let opcode = opcodes::from_name(&name.to_ascii_uppercase())
            .with_context(|| format!("unknown opcode `{name}`"))?;
        point = point.opcode(opcode);
    }

    Ok(MixinDeclaration::injection("cli", targets, point))
}

#[derive(Serialize)]
struct CheckReport<'a> {
    ok: bool,
    diagnostic: Option<&'a Diagnostic>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

fn print_outcome(outcome: &ResolutionOutcome) {
    match outcome {
        ResolutionOutcome::Resolved {
            targets,
            navigation,
            failures,
        } => {
            for target in targets {
                let member = target.member();
                match &target.site {
                    Some(site) => println!(
                        "{member} via {} in {} @{}",
                        target.qualifier, site.method, site.offset
                    ),
                    None => println!("{member}"),
                }
            }
            for found in navigation {
                println!(
                    "  source {:?} {}..{} -> {}",
                    found.kind, found.span.start, found.span.end, found.member
                );
            }
            for failure in failures {
                println!("note: {failure}");
            }
        }
        ResolutionOutcome::Candidates(candidates) => print_candidates(candidates),
        ResolutionOutcome::Unresolved(FailureReason::NoTargetClasses) => {
            println!("unresolved: no target classes");
        }
        ResolutionOutcome::Unresolved(FailureReason::Ambiguous { candidates, .. }) => {
            println!("ambiguous: {} candidates", candidates.len());
            for candidate in candidates {
                println!("  {}", candidate.label);
            }
        }
        ResolutionOutcome::Unresolved(FailureReason::NotFound { failures, blame }) => {
            match blame {
                Some(filter) => println!("unresolved: no match after {filter}"),
                None => println!("unresolved"),
            }
            for failure in failures {
                println!("  {failure}");
            }
        }
    }
}

fn print_candidates(candidates: &[Candidate]) {
    for candidate in candidates {
        println!("{}", candidate.label);
    }
}
