//! CLI for planning savings goals and driving the savings REST API.

use std::io::{self, Write as _};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use savings_rs::calculator::ProgressionPlan;
use savings_rs::client::SavingsBlockingClient;
use savings_rs::error::SavingsError;
use savings_rs::gateway::BlockingGateway;
use savings_rs::models::{
    AddInstallmentsRequest, CreateGoalRequest, CurrencyId, Deposit, DepositId,
    FreeFormDepositRequest, GoalId, GoalStatus, Installment, InstallmentId, InstallmentStatus,
    PayInstallmentRequest, ProgressionType, SavingsGoal,
};
use savings_rs::store::BlockingGoalStore;

/// Environment variable holding the API token.
const TOKEN_ENV: &str = "SAVINGS_API_TOKEN";

/// Environment variable overriding the API base URL.
const URL_ENV: &str = "SAVINGS_API_URL";

/// Savings goals CLI: plan schedules offline or manage goals on the server.
#[derive(Debug, Parser)]
#[command(name = "savings", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Compute a target and installment schedule without contacting the server.
    Plan {
        /// Progression parameters.
        #[command(flatten)]
        plan: PlanArgs,
        /// Seed for the Random shuffle.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List goals, optionally filtered by status and progression type.
    Goals {
        /// Only goals with this status.
        #[arg(long)]
        status: Option<GoalStatus>,
        /// Only goals with this progression type.
        #[arg(long)]
        progression: Option<ProgressionType>,
    },
    /// Show a goal with its installments and deposits.
    Show {
        /// Goal id.
        goal: GoalId,
    },
    /// Create a goal.
    Create(CreateArgs),
    /// Pay a pending installment.
    Pay {
        /// Goal id.
        goal: GoalId,
        /// Installment id.
        installment: InstallmentId,
        /// Paid amount (defaults to the scheduled amount).
        #[arg(long)]
        amount: Option<Decimal>,
        /// Note stored on the deposit.
        #[arg(long)]
        description: Option<String>,
    },
    /// Skip a pending installment.
    Skip {
        /// Goal id.
        goal: GoalId,
        /// Installment id.
        installment: InstallmentId,
    },
    /// Append installments to a Fixed or Random goal.
    AddInstallments {
        /// Goal id.
        goal: GoalId,
        /// Number of installments to append.
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Record a deposit on a free-form goal.
    Deposit {
        /// Goal id.
        goal: GoalId,
        /// Deposited amount.
        #[arg(long)]
        amount: Decimal,
        /// Note stored on the deposit.
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a deposit of a goal.
    DeleteDeposit {
        /// Goal id.
        goal: GoalId,
        /// Deposit id.
        deposit: DepositId,
    },
    /// Delete a goal with its installments and deposits.
    Delete {
        /// Goal id.
        goal: GoalId,
    },
}

/// Progression parameters shared by `plan` and `create`.
#[derive(Debug, Clone, Copy, Args)]
struct PlanArgs {
    /// Progression type (fixed, ascending, descending, random, freeform).
    #[arg(long, default_value = "fixed")]
    progression: ProgressionType,
    /// Base amount per installment.
    #[arg(long)]
    base: Option<Decimal>,
    /// Increment between consecutive installments.
    #[arg(long)]
    increment: Option<Decimal>,
    /// Number of installments.
    #[arg(long)]
    installments: Option<u32>,
}

impl PlanArgs {
    /// Converts the arguments into a plan.
    const fn plan(self) -> ProgressionPlan {
        ProgressionPlan {
            progression: self.progression,
            base_amount: self.base,
            increment_amount: self.increment,
            number_of_installments: self.installments,
        }
    }
}

/// Arguments for the `create` subcommand.
#[derive(Debug, Args)]
struct CreateArgs {
    /// Goal name.
    #[arg(long)]
    name: String,
    /// Currency id.
    #[arg(long, default_value_t = 1)]
    currency: i64,
    /// First day of the plan (YYYY-MM-DD, defaults to today).
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    /// Target amount, required for free-form goals.
    #[arg(long)]
    target: Option<Decimal>,
    /// Free-text description.
    #[arg(long)]
    description: Option<String>,
    /// Progression parameters.
    #[command(flatten)]
    plan: PlanArgs,
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Writes an error line to stderr.
fn report(context: &str, message: &str) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {context}: {message}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Writes a failed operation to stderr.
fn report_err(context: &str, err: &SavingsError) -> io::Result<ExitCode> {
    report(context, &err.user_message())
}

/// Reads the API token from the environment.
fn read_token() -> io::Result<Option<String>> {
    match std::env::var(TOKEN_ENV) {
        Ok(val) if !val.is_empty() => Ok(Some(val)),
        _ => {
            let mut err = io::stderr().lock();
            writeln!(
                err,
                "{} {} environment variable is not set",
                "error:".red().bold(),
                TOKEN_ENV.bold()
            )?;
            writeln!(
                err,
                "  {} create a .env file with {}=<your_token>",
                "hint:".cyan(),
                TOKEN_ENV
            )?;
            Ok(None)
        }
    }
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Command::Plan { plan, seed } = cli.command {
        return cmd_plan(plan.plan(), seed);
    }

    let Some(token) = read_token()? else {
        return Ok(ExitCode::FAILURE);
    };

    let mut builder = SavingsBlockingClient::builder().token(token);
    if let Ok(url) = std::env::var(URL_ENV) {
        builder = builder.base_url(url);
    }
    let client = match builder.build() {
        Ok(client) => client,
        Err(err) => return report("failed to build client", &err.to_string()),
    };

    dispatch(&BlockingGoalStore::new(client), cli.command)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    command: Command,
) -> io::Result<ExitCode> {
    match command {
        Command::Plan { plan, seed } => cmd_plan(plan.plan(), seed),
        Command::Goals {
            status,
            progression,
        } => cmd_goals(store, status, progression),
        Command::Show { goal } => cmd_show(store, goal),
        Command::Create(args) => cmd_create(store, &args),
        Command::Pay {
            goal,
            installment,
            amount,
            description,
        } => cmd_pay(store, goal, installment, amount, description),
        Command::Skip { goal, installment } => cmd_skip(store, goal, installment),
        Command::AddInstallments { goal, count } => cmd_add_installments(store, goal, count),
        Command::Deposit {
            goal,
            amount,
            description,
        } => cmd_deposit(store, goal, amount, description),
        Command::DeleteDeposit { goal, deposit } => cmd_delete_deposit(store, goal, deposit),
        Command::Delete { goal } => cmd_delete(store, goal),
    }
}

/// Executes the `plan` subcommand: prints the target and schedule.
fn cmd_plan(plan: ProgressionPlan, seed: Option<u64>) -> io::Result<ExitCode> {
    let target = match plan.target_amount() {
        Ok(target) => target,
        Err(err) => return report_err("cannot plan goal", &err),
    };
    let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    match plan.schedule(&mut rng) {
        Ok(amounts) => {
            print_plan(&plan, target, &amounts)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_err("cannot plan goal", &err),
    }
}

/// Executes the `goals` subcommand.
fn cmd_goals<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    status: Option<GoalStatus>,
    progression: Option<ProgressionType>,
) -> io::Result<ExitCode> {
    let spinner = make_spinner("Loading goals...");
    let loaded = store.load_goals();
    spinner.finish_and_clear();
    if let Err(err) = loaded {
        return report_err("failed to load goals", &err);
    }
    store.set_status_filter(status);
    store.set_progression_type_filter(progression);
    print_goals_table(&store.filtered_goals())?;
    Ok(ExitCode::SUCCESS)
}

/// Loads a goal with its installments and deposits.
fn load_goal<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    goal: GoalId,
) -> Result<(), SavingsError> {
    let spinner = make_spinner("Loading goal...");
    let loaded = store
        .load_goal_by_id(goal)
        .and_then(|_goal| store.load_installments(goal))
        .and_then(|_installments| store.load_deposits(goal));
    spinner.finish_and_clear();
    loaded.map(|_deposits| ())
}

/// Executes the `show` subcommand.
fn cmd_show<G: BlockingGateway>(store: &BlockingGoalStore<G>, goal: GoalId) -> io::Result<ExitCode> {
    if let Err(err) = load_goal(store, goal) {
        return report_err("failed to load goal", &err);
    }
    print_selected_goal(store)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the create request from CLI arguments.
fn create_request(args: &CreateArgs) -> Result<CreateGoalRequest, SavingsError> {
    let currency = CurrencyId::new(args.currency);
    let start = args
        .start
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let request = if args.plan.progression == ProgressionType::FreeForm {
        let target = args.target.ok_or(SavingsError::MissingParameter {
            progression: ProgressionType::FreeForm,
            parameter: "a target amount",
        })?;
        CreateGoalRequest::free_form(args.name.as_str(), currency, start, target)?
    } else {
        CreateGoalRequest::planned(args.name.as_str(), currency, start, &args.plan.plan())?
    };
    Ok(match args.description.as_deref() {
        Some(description) => request.description(description),
        None => request,
    })
}

/// Executes the `create` subcommand.
fn cmd_create<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    args: &CreateArgs,
) -> io::Result<ExitCode> {
    let request = match create_request(args) {
        Ok(request) => request,
        Err(err) => return report_err("invalid goal", &err),
    };
    let spinner = make_spinner("Creating goal...");
    let created = store.create_goal(&request);
    spinner.finish_and_clear();
    match created {
        Ok(goal) => {
            let id = goal.id.map_or(0, GoalId::into_inner);
            writeln!(
                io::stdout().lock(),
                "{} goal {} with target {:.2}",
                "Created".green().bold(),
                id.bold(),
                goal.target_amount
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_err("failed to create goal", &err),
    }
}

/// Executes the `pay` subcommand.
fn cmd_pay<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    goal: GoalId,
    installment: InstallmentId,
    amount: Option<Decimal>,
    description: Option<String>,
) -> io::Result<ExitCode> {
    if let Err(err) = load_goal(store, goal) {
        return report_err("failed to load goal", &err);
    }
    let Some(slot) = store
        .installments()
        .into_iter()
        .find(|slot| slot.id == installment)
    else {
        return report("cannot pay", &format!("installment {installment} is not part of goal {goal}"));
    };
    let mut request = PayInstallmentRequest::for_installment(&slot);
    if let Some(paid) = amount {
        request = request.amount(paid);
    }
    if let Some(note) = description {
        request = request.description(note);
    }
    match store.pay_installment(goal, installment, &request) {
        Ok(deposit) => {
            writeln!(
                io::stdout().lock(),
                "{} installment #{} ({:.2})",
                "Paid".green().bold(),
                slot.installment_number,
                deposit.amount
            )?;
            print_selected_goal(store)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_err("payment failed", &err),
    }
}

/// Executes the `skip` subcommand.
fn cmd_skip<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    goal: GoalId,
    installment: InstallmentId,
) -> io::Result<ExitCode> {
    if let Err(err) = load_goal(store, goal) {
        return report_err("failed to load goal", &err);
    }
    match store.skip_installment(goal, installment) {
        Ok(skipped) => {
            writeln!(
                io::stdout().lock(),
                "{} installment #{}",
                "Skipped".yellow().bold(),
                skipped.installment_number
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_err("skip failed", &err),
    }
}

/// Executes the `add-installments` subcommand.
fn cmd_add_installments<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    goal: GoalId,
    count: u32,
) -> io::Result<ExitCode> {
    if let Err(err) = load_goal(store, goal) {
        return report_err("failed to load goal", &err);
    }
    match store.add_installments(goal, &AddInstallmentsRequest { count }) {
        Ok(added) => {
            writeln!(
                io::stdout().lock(),
                "{} {} installments",
                "Added".green().bold(),
                added.len()
            )?;
            print_selected_goal(store)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_err("failed to add installments", &err),
    }
}

/// Executes the `deposit` subcommand.
fn cmd_deposit<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    goal: GoalId,
    amount: Decimal,
    description: Option<String>,
) -> io::Result<ExitCode> {
    if let Err(err) = load_goal(store, goal) {
        return report_err("failed to load goal", &err);
    }
    let request = match description {
        Some(note) => FreeFormDepositRequest::new(amount).description(note),
        None => FreeFormDepositRequest::new(amount),
    };
    match store.create_free_form_deposit(goal, &request) {
        Ok(deposit) => {
            writeln!(
                io::stdout().lock(),
                "{} {:.2}",
                "Deposited".green().bold(),
                deposit.amount
            )?;
            print_selected_goal(store)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_err("deposit failed", &err),
    }
}

/// Executes the `delete-deposit` subcommand.
fn cmd_delete_deposit<G: BlockingGateway>(
    store: &BlockingGoalStore<G>,
    goal: GoalId,
    deposit: DepositId,
) -> io::Result<ExitCode> {
    if let Err(err) = load_goal(store, goal) {
        return report_err("failed to load goal", &err);
    }
    match store.delete_deposit(deposit) {
        Ok(()) => {
            writeln!(io::stdout().lock(), "{} deposit {deposit}", "Deleted".red().bold())?;
            print_selected_goal(store)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_err("failed to delete deposit", &err),
    }
}

/// Executes the `delete` subcommand.
fn cmd_delete<G: BlockingGateway>(store: &BlockingGoalStore<G>, goal: GoalId) -> io::Result<ExitCode> {
    match store.delete_goal(goal) {
        Ok(()) => {
            writeln!(io::stdout().lock(), "{} goal {goal}", "Deleted".red().bold())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_err("failed to delete goal", &err),
    }
}

// ── Output formatting ────────────────────────────────────────────────

/// Formats an optional amount, using a dash when absent.
fn amount_or_dash(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "\u{2014}".to_owned(), |value| format!("{value:.2}"))
}

/// Prints a computed plan.
fn print_plan(plan: &ProgressionPlan, target: Decimal, amounts: &[Decimal]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        "Plan".green().bold(),
        format_args!("({})", plan.progression).dimmed()
    )?;
    writeln!(out, "  {} {target:.2}", "Target:".bold())?;
    writeln!(out)?;

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
    ]);
    for (number, amount) in (1_u32..).zip(amounts) {
        _ = table.add_row(vec![Cell::new(number), Cell::new(format!("{amount:.2}"))]);
    }
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints goals in a table.
fn print_goals_table(goals: &[SavingsGoal]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if goals.is_empty() {
        writeln!(out, "{}", "No goals found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Type").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Saved").fg(Color::Cyan),
        Cell::new("Target").fg(Color::Cyan),
        Cell::new("Progress").fg(Color::Cyan),
    ]);

    for goal in goals {
        let id = goal.id.map_or_else(|| "\u{2014}".to_owned(), |id| id.to_string());
        _ = table.add_row(vec![
            Cell::new(id),
            Cell::new(&goal.name),
            Cell::new(goal.progression_type_id),
            status_cell(goal.status_id),
            Cell::new(format!("{:.2}", goal.current_amount)),
            Cell::new(format!("{:.2}", goal.target_amount)),
            Cell::new(format!("{}%", goal.progress())),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Goals".green().bold(),
        format_args!("({})", goals.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Colours a goal status.
fn status_cell(status: GoalStatus) -> Cell {
    let color = match status {
        GoalStatus::Active => Color::Green,
        GoalStatus::Completed => Color::Cyan,
        GoalStatus::Paused => Color::Yellow,
        GoalStatus::Cancelled => Color::DarkGrey,
    };
    Cell::new(status).fg(color)
}

/// Prints the selected goal with its cached installments and deposits.
fn print_selected_goal<G: BlockingGateway>(store: &BlockingGoalStore<G>) -> io::Result<()> {
    let Some(goal) = store.selected_goal() else {
        return Ok(());
    };
    {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        writeln!(
            out,
            "{} {}",
            goal.name.green().bold(),
            format_args!("({}, {})", goal.progression_type_id, goal.status_id).dimmed()
        )?;
        writeln!(
            out,
            "  {} {:.2} / {:.2} ({}%)",
            "Saved:".bold(),
            goal.current_amount,
            goal.target_amount,
            store.selected_goal_progress()
        )?;
        writeln!(
            out,
            "  {} {:.2}",
            "Remaining:".bold(),
            store.selected_goal_remaining()
        )?;
        writeln!(
            out,
            "  {} base {} / increment {} / count {}",
            "Plan:".bold(),
            amount_or_dash(goal.base_amount),
            amount_or_dash(goal.increment_amount),
            goal.number_of_installments
                .map_or_else(|| "\u{2014}".to_owned(), |count| count.to_string())
        )?;
    }
    print_installments_table(&store.installments())?;
    print_deposits_table(&store.sorted_deposits())
}

/// Prints installments in a table.
fn print_installments_table(installments: &[Installment]) -> io::Result<()> {
    if installments.is_empty() {
        return Ok(());
    }
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Paid on").fg(Color::Cyan),
    ]);
    for slot in installments {
        let status = match slot.status_id {
            InstallmentStatus::Pending => Cell::new(slot.status_id),
            InstallmentStatus::Paid => Cell::new(slot.status_id).fg(Color::Green),
            InstallmentStatus::Skipped => Cell::new(slot.status_id).fg(Color::DarkGrey),
        };
        let paid = slot
            .paid_date
            .map_or_else(|| "\u{2014}".to_owned(), |date| date.to_string());
        _ = table.add_row(vec![
            Cell::new(slot.id),
            Cell::new(slot.installment_number),
            Cell::new(format!("{:.2}", slot.amount)),
            status,
            Cell::new(paid),
        ]);
    }
    let mut out = io::stdout().lock();
    writeln!(out)?;
    writeln!(out, "{}", "Installments".green().bold())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints deposits in a table.
fn print_deposits_table(deposits: &[Deposit]) -> io::Result<()> {
    if deposits.is_empty() {
        return Ok(());
    }
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
        Cell::new("Note").fg(Color::Cyan),
    ]);
    for deposit in deposits {
        _ = table.add_row(vec![
            Cell::new(deposit.id),
            Cell::new(deposit.deposit_date),
            Cell::new(format!("{:.2}", deposit.amount)).fg(Color::Green),
            Cell::new(deposit.description.as_deref().unwrap_or("")),
        ]);
    }
    let mut out = io::stdout().lock();
    writeln!(out)?;
    writeln!(out, "{}", "Deposits".green().bold())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;
    use savings_rs::gateway::InMemoryGateway;

    /// Creates a store over a seeded in-memory backend.
    fn mock_store() -> BlockingGoalStore<InMemoryGateway> {
        BlockingGoalStore::new(InMemoryGateway::with_seed(11))
    }

    /// Creates a Fixed goal of four 250 installments.
    fn seed_fixed(store: &BlockingGoalStore<InMemoryGateway>) -> SavingsGoal {
        let request = CreateGoalRequest::planned(
            "Bike",
            CurrencyId::new(1),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            &ProgressionPlan::fixed(dec!(250), 4),
        )
        .unwrap();
        store.gateway().create_goal(&request).unwrap()
    }

    fn plan_args(progression: ProgressionType) -> PlanArgs {
        PlanArgs {
            progression,
            base: Some(dec!(100)),
            increment: Some(dec!(50)),
            installments: Some(4),
        }
    }

    #[test]
    fn parse_date_valid() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("29/02/2024").is_err());
    }

    #[test]
    fn cli_parses_plan_arguments() {
        let cli = Cli::try_parse_from([
            "savings",
            "plan",
            "--progression",
            "ascending",
            "--base",
            "100",
            "--increment",
            "50",
            "--installments",
            "4",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Plan { plan, seed: None } if plan.plan().target_amount().unwrap() == dec!(700)
        ));
    }

    #[test]
    fn cli_parses_goal_filters() {
        let cli = Cli::try_parse_from(["savings", "goals", "--status", "paused", "--progression", "5"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Goals {
                status: Some(GoalStatus::Paused),
                progression: Some(ProgressionType::FreeForm),
            }
        ));
    }

    #[test]
    fn cmd_plan_succeeds_for_complete_plan() {
        let code = cmd_plan(plan_args(ProgressionType::Random).plan(), Some(9)).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn cmd_plan_fails_without_parameters() {
        let args = PlanArgs {
            progression: ProgressionType::Ascending,
            base: Some(dec!(100)),
            increment: None,
            installments: Some(4),
        };
        assert_eq!(cmd_plan(args.plan(), None).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn create_request_free_form_requires_target() {
        let args = CreateArgs {
            name: "Fund".to_owned(),
            currency: 1,
            start: None,
            target: None,
            description: None,
            plan: plan_args(ProgressionType::FreeForm),
        };
        assert!(matches!(
            create_request(&args),
            Err(SavingsError::MissingParameter { .. })
        ));
    }

    #[test]
    fn cmd_create_adds_goal() {
        let store = mock_store();
        let args = CreateArgs {
            name: "Car".to_owned(),
            currency: 2,
            start: None,
            target: None,
            description: Some("new car".to_owned()),
            plan: plan_args(ProgressionType::Fixed),
        };
        assert_eq!(cmd_create(&store, &args).unwrap(), ExitCode::SUCCESS);
        let goal = store.selected_goal().unwrap();
        assert_eq!(goal.target_amount, dec!(400));
        assert_eq!(goal.description.as_deref(), Some("new car"));
    }

    #[test]
    fn cmd_goals_lists() {
        let store = mock_store();
        let _goal = seed_fixed(&store);
        let code = cmd_goals(&store, Some(GoalStatus::Active), None).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(store.filtered_goals().len(), 1);
    }

    #[test]
    fn cmd_show_unknown_goal_fails() {
        let store = mock_store();
        assert_eq!(cmd_show(&store, GoalId::new(77)).unwrap(), ExitCode::FAILURE);
        assert!(store.error().is_some());
    }

    #[test]
    fn cmd_pay_then_skip() {
        let store = mock_store();
        let goal = seed_fixed(&store);
        let id = goal.id.unwrap();
        let installments = store.gateway().list_installments(id).unwrap();
        let first = installments.first().unwrap().id;
        let second = installments.get(1).unwrap().id;

        assert_eq!(cmd_pay(&store, id, first, None, None).unwrap(), ExitCode::SUCCESS);
        assert_eq!(store.selected_goal_progress(), 25);
        assert_eq!(cmd_pay(&store, id, first, None, None).unwrap(), ExitCode::FAILURE);
        assert_eq!(cmd_skip(&store, id, second).unwrap(), ExitCode::SUCCESS);
        assert_eq!(store.pending_installments().len(), 2);
    }

    #[test]
    fn cmd_add_installments_extends_fixed_goal() {
        let store = mock_store();
        let id = seed_fixed(&store).id.unwrap();
        assert_eq!(cmd_add_installments(&store, id, 2).unwrap(), ExitCode::SUCCESS);
        assert_eq!(store.selected_goal().unwrap().target_amount, dec!(1500));
    }

    #[test]
    fn cmd_deposit_and_delete_on_free_form_goal() {
        let store = mock_store();
        let request = CreateGoalRequest::free_form(
            "Buffer",
            CurrencyId::new(1),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            dec!(300),
        )
        .unwrap();
        let id = store.gateway().create_goal(&request).unwrap().id.unwrap();

        assert_eq!(
            cmd_deposit(&store, id, dec!(120), Some("gift".to_owned())).unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(cmd_deposit(&store, id, dec!(500), None).unwrap(), ExitCode::FAILURE);
        let deposit = store.deposits().first().unwrap().id;
        assert_eq!(cmd_delete_deposit(&store, id, deposit).unwrap(), ExitCode::SUCCESS);
        assert_eq!(store.selected_goal().unwrap().current_amount, dec!(0));
    }

    #[test]
    fn cmd_delete_removes_goal() {
        let store = mock_store();
        let id = seed_fixed(&store).id.unwrap();
        assert_eq!(cmd_delete(&store, id).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_delete(&store, id).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn make_spinner_creates_spinner() {
        let spinner = make_spinner("Testing...");
        spinner.finish_and_clear();
    }
}
