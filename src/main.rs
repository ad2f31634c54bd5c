use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use prgate_ado::auth::PatAuthenticator;
use prgate_ado::client::AdoClient;
use prgate_core::{GateConfig, Provider, Severity};
use prgate_review::llm::LlmAdapter;
use prgate_review::reviewer::{ReviewOptions, Reviewer};

#[derive(Parser)]
#[command(
    name = "prgate",
    version,
    about = "Automated first-pass review gate for Azure DevOps pull requests",
    long_about = "prgate runs an LLM-backed first-pass review over an Azure DevOps pull request\n\
                   and posts the critique back as inline comment threads plus a summary.\n\n\
                   A PR with any BLOCK-severity issue fails the gate (exit code 1).\n\n\
                   Examples:\n  \
                     prgate init                              Create a .prgate.toml config file\n  \
                     prgate review --pr 42                    Review PR 42 using the config file\n  \
                     prgate review --pr 42 --dry-run          Print the critique without posting\n  \
                     prgate review --org contoso --project Platform --pr 42\n  \
                     prgate doctor                            Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .prgate.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Review a pull request and post the critique
    #[command(long_about = "Review a pull request and post the critique.\n\n\
        Fetches PR metadata and per-file diffs from Azure DevOps, submits them to the\n\
        configured LLM backend, and posts inline comment threads plus a closed summary\n\
        thread. Exits 1 when any BLOCK-severity issue is found, 2 on errors.\n\n\
        Examples:\n  prgate review --pr 42\n  prgate review --pr 42 --repo platform-api --dry-run\n  \
        prgate review --org contoso --project Platform --pr 42 --provider openai")]
    Review {
        /// Pull request id
        #[arg(long)]
        pr: u64,

        /// Azure DevOps organization (overrides config)
        #[arg(long)]
        org: Option<String>,

        /// Azure DevOps project (overrides config)
        #[arg(long)]
        project: Option<String>,

        /// Repository name or id (default: config, then project name)
        #[arg(long)]
        repo: Option<String>,

        /// LLM provider: claude, openai, or azure-openai (overrides config)
        #[arg(long)]
        provider: Option<String>,

        /// Model identifier (overrides the provider default)
        #[arg(long)]
        model: Option<String>,

        /// Print the critique without posting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Create a default .prgate.toml configuration file
    #[command(long_about = "Create a default .prgate.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .prgate.toml already exists.")]
    Init,
    /// Check your prgate setup and environment
    #[command(long_about = "Check your prgate setup and environment.\n\n\
        Runs diagnostics for the config file, Azure DevOps settings, the personal\n\
        access token, and the LLM provider API key.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m⛩\x1b[0m \x1b[1mprgate\x1b[0m v{version} — the review gate your PRs pass through\n");

        println!("Quick start:");
        println!("  \x1b[36mprgate init\x1b[0m                Create a .prgate.toml config file");
        println!("  \x1b[36mprgate review --pr 42\x1b[0m      Review pull request 42");
        println!("  \x1b[36mprgate doctor\x1b[0m              Check your setup\n");

        println!("All commands:");
        println!("  \x1b[32mreview\x1b[0m   LLM-backed PR review with inline + summary comments");
        println!("  \x1b[32mdoctor\x1b[0m   Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m     Create default configuration\n");
    } else {
        println!("prgate v{version} — the review gate your PRs pass through\n");

        println!("Quick start:");
        println!("  prgate init                Create a .prgate.toml config file");
        println!("  prgate review --pr 42      Review pull request 42");
        println!("  prgate doctor              Check your setup\n");

        println!("All commands:");
        println!("  review   LLM-backed PR review with inline + summary comments");
        println!("  doctor   Check your setup and environment");
        println!("  init     Create default configuration\n");
    }

    println!("Run 'prgate <command> --help' for details.");
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(config: &GateConfig, use_color: bool) {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Config file
    let config_path = std::path::Path::new(".prgate.toml");
    if config_path.exists() {
        checks.push(CheckResult::pass("config_file", ".prgate.toml found"));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".prgate.toml not found",
            "run 'prgate init' to create a default config",
        ));
    }

    // 2. Azure DevOps settings
    match (&config.ado.organization, &config.ado.project) {
        (Some(org), Some(project)) => checks.push(CheckResult::pass(
            "azure_devops",
            format!("{org}/{project}"),
        )),
        _ => checks.push(CheckResult::fail(
            "azure_devops",
            "organization or project not configured",
            "set organization and project under [ado] in .prgate.toml, or pass --org/--project",
        )),
    }

    // 3. Personal access token
    let pat_env = &config.ado.pat_env;
    match std::env::var(pat_env) {
        Ok(token) if !token.is_empty() => {
            checks.push(CheckResult::pass("access_token", format!("{pat_env} set")));
        }
        _ => checks.push(CheckResult::fail(
            "access_token",
            format!("{pat_env} not set"),
            format!("export {pat_env}=<personal access token with Code read+write scope>"),
        )),
    }

    // 4. LLM provider + API key
    let provider = config.llm.provider;
    checks.push(CheckResult::pass(
        "llm_provider",
        format!("{provider} (model: {})", config.llm.resolved_model()),
    ));
    match config.llm.resolved_api_key() {
        Ok(_) => checks.push(CheckResult::pass(
            "llm_api_key",
            format!("{} set", provider.api_key_env()),
        )),
        Err(_) => checks.push(CheckResult::fail(
            "llm_api_key",
            format!("{} not set", provider.api_key_env()),
            format!(
                "export {}=... or set api_key in .prgate.toml [llm]",
                provider.api_key_env()
            ),
        )),
    }

    // 5. Azure endpoint, only meaningful for the azure-openai provider
    if provider == Provider::AzureOpenAi {
        match config.llm.resolved_endpoint() {
            Some(endpoint) => checks.push(CheckResult::pass("azure_endpoint", endpoint)),
            None => checks.push(CheckResult::fail(
                "azure_endpoint",
                "no endpoint configured",
                "export AZURE_OPENAI_ENDPOINT=... or set endpoint in .prgate.toml [llm]",
            )),
        }
    }

    let version = env!("CARGO_PKG_VERSION");
    println!("prgate v{version} — Environment Check\n");

    for check in &checks {
        let sym = if use_color {
            check.colored_symbol()
        } else {
            check.symbol().to_string()
        };
        let label = check.name.replace('_', " ");
        println!("  {sym} {label:<16} {}", check.detail);
        if let Some(hint) = &check.hint {
            println!("    hint: {hint}");
        }
    }

    let passed = checks.iter().filter(|c| c.status == "pass").count();
    let failed = checks.iter().filter(|c| c.status == "fail").count();
    println!("\n{passed} checks passed, {failed} failed");
}

const DEFAULT_CONFIG: &str = r#"# prgate configuration
# See: https://github.com/prgate/prgate

[ado]
# organization = "contoso"
# project = "Platform"
# repository = "platform-api"
# pat_env = "AZURE_DEVOPS_PAT"

[llm]
# provider = "claude"          # claude | openai | azure-openai
# model = "claude-sonnet-4-20250514"
# endpoint = "https://<resource>.openai.azure.com"   # azure-openai only

[rules]
# path = "rules/pr-review.md"
# style_guide = "rules/clean-code.md"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GateConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = std::path::Path::new(".prgate.toml");
            if default_path.exists() {
                GateConfig::from_file(default_path).into_diagnostic()?
            } else {
                GateConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Review {
            pr,
            ref org,
            ref project,
            ref repo,
            ref provider,
            ref model,
            dry_run,
        }) => {
            let mut config = config;
            if let Some(name) = provider {
                config.llm.provider = name
                    .parse()
                    .map_err(|e: String| miette::miette!("{e}"))?;
            }
            if let Some(model) = model {
                config.llm.model = Some(model.clone());
            }

            let organization = org
                .clone()
                .or_else(|| config.ado.organization.clone())
                .ok_or_else(|| {
                    miette::miette!(
                        help = "Pass --org or set organization under [ado] in .prgate.toml",
                        "No Azure DevOps organization configured"
                    )
                })?;
            let project = project
                .clone()
                .or_else(|| config.ado.project.clone())
                .ok_or_else(|| {
                    miette::miette!(
                        help = "Pass --project or set project under [ado] in .prgate.toml",
                        "No Azure DevOps project configured"
                    )
                })?;
            let repository = repo
                .clone()
                .or_else(|| config.ado.repository.clone())
                .unwrap_or_else(|| project.clone());

            let auth = PatAuthenticator::new(&config.ado.pat_env);
            let client = AdoClient::new(&organization, &project, auth).into_diagnostic()?;
            let llm = LlmAdapter::from_config(&config.llm).into_diagnostic()?;
            let reviewer = Reviewer::new(client, llm, config.rules.clone());

            let options = ReviewOptions {
                repository_id: repository,
                pull_request_id: pr,
                dry_run,
            };

            let is_tty = std::io::stderr().is_terminal();
            let spinner = if is_tty {
                let pb = indicatif::ProgressBar::new_spinner();
                pb.set_style(
                    indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                        .into_diagnostic()?,
                );
                pb.set_message(format!("Reviewing PR #{pr}..."));
                pb.enable_steady_tick(std::time::Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };

            let output = match reviewer.review(&options).await {
                Ok(output) => {
                    if let Some(pb) = spinner {
                        pb.finish_with_message("Done");
                    }
                    output
                }
                Err(err) => {
                    if let Some(pb) = spinner {
                        pb.finish_with_message("Failed");
                    }
                    eprintln!("Error: {err}");
                    std::process::exit(2);
                }
            };

            if !dry_run {
                println!("\n{}", output.result);
            }
            println!(
                "BLOCK: {} | HIGH: {} | MEDIUM: {}",
                output.result.count(Severity::Block),
                output.result.count(Severity::High),
                output.result.count(Severity::Medium),
            );
            if !dry_run {
                let summary_note = if output.summary_posted {
                    "summary posted"
                } else {
                    "summary failed"
                };
                println!(
                    "Posted {}/{} inline comments, {summary_note}",
                    output.posted_comments,
                    output.result.issues.len(),
                );
            }

            // The gate itself: any blocker fails the run.
            if output.result.has_blockers() {
                std::process::exit(1);
            }
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".prgate.toml");
            if path.exists() {
                miette::bail!(".prgate.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .prgate.toml with default configuration");
        }
        Some(Command::Doctor) => {
            run_doctor(&config, use_color);
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "prgate", &mut std::io::stdout());
        }
    }

    Ok(())
}
