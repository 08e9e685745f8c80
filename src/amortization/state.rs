//! Running state of a schedule while it is being generated

/// State of the loan at a point in time during generation
#[derive(Debug, Clone)]
pub struct AmortizationState {
    /// Current payment number (1-indexed, 0 before the first month)
    pub month: u32,

    /// Outstanding capital at the start of the current month
    pub balance: f64,

    /// TAN in force
    pub current_rate: f64,

    /// Installment in force
    pub installment: f64,

    /// Installment computed at month 1
    pub initial_installment: f64,

    /// Installment after a mixed-rate switch, once it has happened
    pub installment_after_switch: Option<f64>,

    // Full-precision accumulators
    pub total_interest: f64,
    pub total_stamp_duty: f64,
    pub total_insurance: f64,
}

impl AmortizationState {
    /// Initialise state at contract start
    pub fn new(principal: f64, rate: f64, installment: f64) -> Self {
        Self {
            month: 0,
            balance: principal,
            current_rate: rate,
            installment,
            initial_installment: installment,
            installment_after_switch: None,
            total_interest: 0.0,
            total_stamp_duty: 0.0,
            total_insurance: 0.0,
        }
    }

    /// Advance to next month
    pub fn advance_month(&mut self) {
        self.month += 1;
    }

    /// Move to a new rate with a freshly re-amortized installment
    pub fn switch_rate(&mut self, rate: f64, installment: f64) {
        self.current_rate = rate;
        self.installment = installment;
        self.installment_after_switch = Some(installment);
    }

    /// Add one month's charges to the running totals
    pub fn accumulate(&mut self, interest: f64, stamp_duty: f64, insurance: f64) {
        self.total_interest += interest;
        self.total_stamp_duty += stamp_duty;
        self.total_insurance += insurance;
    }
}
