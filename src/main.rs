//! Portuguese mortgage CLI
//!
//! Command-line interface for schedules, early repayments, rate revisions and
//! batch runs over a loan book.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use pt_mortgage::early_repayment::{EarlyRepaymentCalculator, EarlyRepaymentParams, RepaymentStrategy};
use pt_mortgage::loan::{load_loans, LoanParams, RateRegime, RateType};
use pt_mortgage::revision::{estimate_revision_impact, next_revision_date, MarketRates, RevisionImpact, SimulationSnapshot};
use pt_mortgage::{AmortizationEngine, CalculationResult, RegulatoryAssumptions, ScenarioRunner};

const ASSUMPTIONS_ENV: &str = "PT_MORTGAGE_ASSUMPTIONS";

#[derive(Parser)]
#[command(
    name = "pt-mortgage",
    version,
    about = "Amortization schedules and early repayment maths for Portuguese mortgages"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Assumptions directory containing regulatory.csv (defaults to $PT_MORTGAGE_ASSUMPTIONS,
    /// then the built-in Portuguese values)
    #[arg(long, global = true)]
    assumptions: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a full amortization schedule
    Schedule {
        #[command(flatten)]
        loan: LoanArgs,

        /// Rows to print (0 prints all)
        #[arg(long, default_value_t = 12)]
        rows: usize,

        /// Write the full schedule to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Fee, new balance and recalculated loan after an early repayment
    EarlyRepayment(EarlyRepaymentArgs),
    /// Early repayment fee only
    Fee {
        #[arg(long)]
        amount: f64,
        #[arg(long, value_enum, default_value = "variable")]
        rate_type: RateTypeArg,
        /// Repayment falls in a fee exemption window
        #[arg(long)]
        exempt: bool,
    },
    /// Estimate the payment change at the next Euribor revision
    Revision(RevisionArgs),
    /// Run every loan of a CSV loan book
    Batch {
        /// Loan book CSV
        input: PathBuf,

        /// Write the per-loan summary to this CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct LoanArgs {
    #[arg(long)]
    principal: f64,
    /// TAN as a decimal (0.035 for 3.5%)
    #[arg(long)]
    tan: f64,
    /// Term in months
    #[arg(long)]
    term: u32,
    /// Stamp duty on interest (defaults to the assumptions value)
    #[arg(long)]
    stamp_duty: Option<f64>,
    /// Monthly life insurance rate on the outstanding balance
    #[arg(long, default_value_t = 0.0)]
    insurance: f64,
    #[arg(long, value_enum, default_value = "variable")]
    regime: RegimeArg,
    #[arg(long)]
    fixed_period: Option<u32>,
    #[arg(long)]
    fixed_rate: Option<f64>,
    #[arg(long)]
    variable_rate: Option<f64>,
}

impl LoanArgs {
    fn into_params(self, assumptions: &RegulatoryAssumptions) -> LoanParams {
        let mut params = LoanParams::new(self.principal, self.tan, self.term)
            .with_stamp_duty_rate(self.stamp_duty.unwrap_or(assumptions.default_stamp_duty_rate))
            .with_insurance_rate(self.insurance)
            .with_regime(self.regime.into());
        params.fixed_period_months = self.fixed_period;
        params.fixed_rate = self.fixed_rate;
        params.variable_rate = self.variable_rate;
        params
    }
}

#[derive(Args, Debug)]
struct EarlyRepaymentArgs {
    /// Outstanding balance before the repayment
    #[arg(long)]
    balance: f64,
    /// Capital repaid
    #[arg(long)]
    amount: f64,
    #[arg(long, value_enum, default_value = "variable")]
    rate_type: RateTypeArg,
    #[arg(long)]
    exempt: bool,
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
    /// TAN in force, required with --strategy
    #[arg(long)]
    tan: Option<f64>,
    /// Months left on the current schedule
    #[arg(long)]
    remaining_months: Option<u32>,
    /// Current installment, required for reduce-term
    #[arg(long)]
    installment: Option<f64>,
}

impl EarlyRepaymentArgs {
    fn into_params(self) -> Result<EarlyRepaymentParams> {
        let mut params = EarlyRepaymentParams::new(self.balance, self.amount, self.rate_type.into());
        params.fee_exemption = self.exempt;

        let Some(strategy) = self.strategy else {
            return Ok(params);
        };
        let tan = self.tan.context("--tan is required with --strategy")?;

        params.strategy = Some(match strategy {
            StrategyArg::ReduceInstallment => RepaymentStrategy::ReduceInstallment {
                remaining_months: self
                    .remaining_months
                    .context("--remaining-months is required for reduce-installment")?,
                tan,
            },
            StrategyArg::ReduceTerm => RepaymentStrategy::ReduceTerm {
                current_installment: self
                    .installment
                    .context("--installment is required for reduce-term")?,
                tan,
                remaining_months: self.remaining_months,
            },
        });
        Ok(params)
    }
}

#[derive(Args, Debug)]
struct RevisionArgs {
    /// Stored simulation snapshot (JSON)
    #[arg(long)]
    snapshot: PathBuf,
    /// Euribor 3 months, in percent
    #[arg(long)]
    rate_3m: Option<f64>,
    /// Euribor 6 months, in percent
    #[arg(long)]
    rate_6m: Option<f64>,
    /// Euribor 12 months, in percent
    #[arg(long)]
    rate_12m: Option<f64>,
    /// Evaluation date (YYYY-MM-DD), today by default
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RegimeArg {
    Variable,
    Fixed,
    Mixed,
}

impl From<RegimeArg> for RateRegime {
    fn from(arg: RegimeArg) -> Self {
        match arg {
            RegimeArg::Variable => RateRegime::Variable,
            RegimeArg::Fixed => RateRegime::Fixed,
            RegimeArg::Mixed => RateRegime::Mixed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RateTypeArg {
    Variable,
    Fixed,
}

impl From<RateTypeArg> for RateType {
    fn from(arg: RateTypeArg) -> Self {
        match arg {
            RateTypeArg::Variable => RateType::Variable,
            RateTypeArg::Fixed => RateType::Fixed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    ReduceInstallment,
    ReduceTerm,
}

/// One line of the batch summary export
#[derive(Debug, Serialize)]
struct BatchRow {
    name: String,
    monthly_payment: Option<f64>,
    total_payment: Option<f64>,
    total_interest: Option<f64>,
    effective_rate: Option<f64>,
    error: Option<String>,
}

fn load_assumptions(path: Option<PathBuf>) -> Result<RegulatoryAssumptions> {
    let path = path.or_else(|| env::var_os(ASSUMPTIONS_ENV).map(PathBuf::from));
    match path {
        Some(dir) => RegulatoryAssumptions::from_csv_path(&dir)
            .with_context(|| format!("Failed to load assumptions from {}", dir.display())),
        None => Ok(RegulatoryAssumptions::portugal()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_schedule_csv(path: &Path, result: &CalculationResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Unable to create {}", path.display()))?;
    for row in &result.table {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_schedule(result: &CalculationResult, rows: usize) {
    let summary = &result.summary;

    println!("{:>5} {:>12} {:>12} {:>12} {:>10} {:>10} {:>12} {:>14}",
        "Month", "Installment", "Interest", "Principal", "Stamp", "Insurance", "Total", "Balance");
    println!("{}", "-".repeat(96));

    let shown = if rows == 0 { result.table.len() } else { rows.min(result.table.len()) };
    for row in result.table.iter().take(shown) {
        println!("{:>5} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>10.2} {:>12.2} {:>14.2}",
            row.payment_number,
            row.installment,
            row.interest,
            row.principal,
            row.stamp_duty,
            row.insurance,
            row.total_payment,
            row.remaining_balance,
        );
    }
    if result.table.len() > shown {
        println!("... ({} more months)", result.table.len() - shown);
    }

    println!();
    println!("Monthly payment:    {:>14.2}", summary.monthly_payment);
    if let (Some(after), Some(months)) = (summary.monthly_payment_after_fixed_period, summary.fixed_period_months) {
        println!("After month {:<4}    {:>14.2} ({:+.2}, {:+.2}%)",
            months,
            after,
            summary.payment_increase.unwrap_or(0.0),
            summary.payment_increase_percent.unwrap_or(0.0),
        );
    }
    println!("Total paid:         {:>14.2}", summary.total_payment);
    println!("Total interest:     {:>14.2}", summary.total_interest);
    println!("Total stamp duty:   {:>14.2}", summary.total_stamp_duty);
    println!("Total insurance:    {:>14.2}", summary.total_insurance);
    println!("Interest/principal: {:>13.2}%", summary.interest_to_principal_ratio);
    if let Some(rate) = summary.effective_rate {
        println!("Effective rate:     {:>13.2}%", rate);
    }
}

fn run_schedule(engine: &AmortizationEngine, params: LoanParams, rows: usize, csv: Option<PathBuf>, json: bool) -> Result<()> {
    let result = engine.calculate(&params).context("Invalid loan parameters")?;

    if let Some(path) = csv {
        write_schedule_csv(&path, &result)?;
        eprintln!("Schedule written to {}", path.display());
    }

    if json {
        print_json(&result)
    } else {
        print_schedule(&result, rows);
        Ok(())
    }
}

fn run_early_repayment(calculator: &EarlyRepaymentCalculator, args: EarlyRepaymentArgs, json: bool) -> Result<()> {
    let params = args.into_params()?;
    params.validate(calculator.assumptions()).context("Invalid early repayment")?;
    let result = calculator.apply(&params);

    if json {
        return print_json(&result);
    }

    println!("Fee:            {:>12.2} ({:.3}%)", result.fee.total_fee, result.fee.fee_percentage);
    println!("  base:         {:>12.2}", result.fee.base_fee);
    println!("  stamp duty:   {:>12.2}", result.fee.stamp_duty);
    println!("New balance:    {:>12.2}", result.new_balance);
    if let Some(installment) = result.new_installment {
        println!("Installment:    {:>12.2}", installment);
    }
    if let Some(months) = result.new_term_months {
        println!("Term (months):  {:>12}", months);
    }
    if let Some(saved) = result.interest_saved {
        println!("Interest saved: {:>12.2}", saved);
    }
    if result.negative_amortization {
        println!("Warning: the installment no longer covers interest on the new balance");
    }
    Ok(())
}

fn run_revision(args: RevisionArgs, json: bool) -> Result<()> {
    let file = File::open(&args.snapshot).with_context(|| format!("Unable to open {}", args.snapshot.display()))?;
    let snapshot: SimulationSnapshot = serde_json::from_reader(file).context("Invalid simulation snapshot")?;

    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let market = MarketRates {
        rate_3m: args.rate_3m,
        rate_6m: args.rate_6m,
        rate_12m: args.rate_12m,
    };
    let has_rates = market.rate_3m.is_some() || market.rate_6m.is_some() || market.rate_12m.is_some();

    let impact = estimate_revision_impact(&snapshot, has_rates.then_some(&market), as_of);
    let next_revision = snapshot
        .euribor_tenor
        .and_then(|tenor| next_revision_date(snapshot.contract_start, tenor, as_of));

    if json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct RevisionOutput {
            impact: RevisionImpact,
            next_revision: Option<NaiveDate>,
        }
        return print_json(&RevisionOutput { impact, next_revision });
    }

    println!("Revision: {}", impact);
    if let RevisionImpact::Estimate(estimate) = impact {
        println!("  scheduled payment: {:>10.2}", estimate.old_payment);
        println!("  new payment:       {:>10.2}", estimate.new_payment);
    }
    if let Some(date) = next_revision {
        println!("Next revision: {}", date);
    }
    Ok(())
}

fn run_batch(runner: &ScenarioRunner, input: &Path, output: Option<PathBuf>, json: bool) -> Result<()> {
    let records = load_loans(input).with_context(|| format!("Failed to load loans from {}", input.display()))?;
    if records.is_empty() {
        bail!("No loans in {}", input.display());
    }
    eprintln!("Loaded {} loans", records.len());

    let params: Vec<LoanParams> = records.iter().map(|r| r.params.clone()).collect();
    let results = runner.run_batch(&params);

    let rows: Vec<BatchRow> = records
        .iter()
        .zip(results)
        .map(|(record, result)| match result {
            Ok(result) => BatchRow {
                name: record.name.clone(),
                monthly_payment: Some(result.summary.monthly_payment),
                total_payment: Some(result.summary.total_payment),
                total_interest: Some(result.summary.total_interest),
                effective_rate: result.summary.effective_rate,
                error: None,
            },
            Err(e) => BatchRow {
                name: record.name.clone(),
                monthly_payment: None,
                total_payment: None,
                total_interest: None,
                effective_rate: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    if let Some(path) = output {
        let mut writer =
            csv::Writer::from_path(&path).with_context(|| format!("Unable to create {}", path.display()))?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        eprintln!("Summary written to {}", path.display());
    }

    if json {
        return print_json(&rows);
    }

    println!("{:<20} {:>12} {:>14} {:>14} {:>9}", "Loan", "Monthly", "Total paid", "Interest", "TAEG");
    println!("{}", "-".repeat(73));
    for row in &rows {
        match (&row.error, row.monthly_payment, row.total_payment, row.total_interest) {
            (None, Some(monthly), Some(total), Some(interest)) => println!(
                "{:<20} {:>12.2} {:>14.2} {:>14.2} {:>8.2}%",
                row.name,
                monthly,
                total,
                interest,
                row.effective_rate.unwrap_or(0.0),
            ),
            (error, ..) => println!("{:<20} error: {}", row.name, error.as_deref().unwrap_or("unknown")),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let assumptions = load_assumptions(cli.assumptions)?;

    match cli.command {
        Command::Schedule { loan, rows, csv } => {
            let params = loan.into_params(&assumptions);
            run_schedule(&AmortizationEngine::new(assumptions), params, rows, csv, cli.json)
        }
        Command::EarlyRepayment(args) => {
            run_early_repayment(&EarlyRepaymentCalculator::new(assumptions), args, cli.json)
        }
        Command::Fee { amount, rate_type, exempt } => {
            let fee = EarlyRepaymentCalculator::new(assumptions).fee(rate_type.into(), amount, exempt);
            if cli.json {
                print_json(&fee)
            } else {
                println!("Base fee:   {:>10.2}", fee.base_fee);
                println!("Stamp duty: {:>10.2}", fee.stamp_duty);
                println!("Total:      {:>10.2} ({:.3}%)", fee.total_fee, fee.fee_percentage);
                Ok(())
            }
        }
        Command::Revision(args) => run_revision(args, cli.json),
        Command::Batch { input, output } => {
            run_batch(&ScenarioRunner::with_assumptions(assumptions), &input, output, cli.json)
        }
    }
}
