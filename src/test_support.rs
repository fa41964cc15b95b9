//! Synthetic IBM-layout employee data for tests.
//!
//! Rows are drawn from realistic ranges and categories. Attrition
//! is sampled from a logistic model with planted signal: overtime,
//! low job satisfaction, being single, frequent travel, low income
//! and youth all raise the odds of leaving.

use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::data::loader::CsvLoader;
use crate::domain::{dataset::Dataset, schema::Schema};

const TRAVEL: [(&str, f64); 3] = [("Travel_Rarely", 0.71), ("Travel_Frequently", 0.19), ("Non-Travel", 0.10)];
const FIELDS: [&str; 6] = ["Life Sciences", "Medical", "Marketing", "Technical Degree", "Human Resources", "Other"];
const MARITAL: [&str; 3] = ["Single", "Married", "Divorced"];
const RND_ROLES: [&str; 5] = [
    "Research Scientist",
    "Laboratory Technician",
    "Manufacturing Director",
    "Healthcare Representative",
    "Research Director",
];
const SALES_ROLES: [&str; 3] = ["Sales Executive", "Sales Representative", "Manager"];
const HR_ROLES: [&str; 2] = ["Human Resources", "Manager"];

/// `rows` employees as CSV text with the IBM header.
pub fn employee_csv(rows: usize, seed: u64) -> String {
    let schema = Schema::employee();
    let header: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header).unwrap();
    for i in 0..rows {
        let row = employee_row(i, &mut rng);
        writer.write_record(header.iter().map(|name| row[*name].as_str())).unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

/// Write `rows` employees to `<dir>/attrition.csv`.
pub fn write_employee_csv(dir: &Path, rows: usize, seed: u64) -> PathBuf {
    let path = dir.join("attrition.csv");
    std::fs::write(&path, employee_csv(rows, seed)).unwrap();
    path
}

/// `rows` employees loaded through the CSV reader.
pub fn employee_dataset(rows: usize, seed: u64) -> Dataset {
    let text = employee_csv(rows, seed);
    CsvLoader::new("synthetic.csv").read_from(text.as_bytes()).unwrap()
}

fn employee_row(index: usize, rng: &mut StdRng) -> FxHashMap<&'static str, String> {
    let age: u32 = rng.gen_range(18..=60);
    let travel = TRAVEL
        .choose_weighted(rng, |t| t.1)
        .map(|t| t.0)
        .unwrap_or("Travel_Rarely");
    let department = match rng.gen_range(0..100) {
        0..=64 => "Research & Development",
        65..=95 => "Sales",
        _ => "Human Resources",
    };
    let roles: &[&str] = match department {
        "Sales" => &SALES_ROLES,
        "Human Resources" => &HR_ROLES,
        _ => &RND_ROLES,
    };
    let role = *roles.choose(rng).unwrap();
    let job_level: u32 = (1 + (age.saturating_sub(18) / 10) + rng.gen_range(0..2)).min(5);
    let income: u32 = 1000 + job_level * 3200 + rng.gen_range(0..2500);
    let total_years: u32 = rng.gen_range(0..=age - 18).min(40);
    let years_at_company: u32 = rng.gen_range(0..=total_years);
    let job_satisfaction: u32 = rng.gen_range(1..=4);
    let marital = *MARITAL.choose(rng).unwrap();
    let overtime = rng.gen_bool(0.28);

    let logit = -2.4
        + if overtime { 1.6 } else { 0.0 }
        + if job_satisfaction == 1 { 0.7 } else { 0.0 }
        + if marital == "Single" { 0.8 } else { 0.0 }
        + if travel == "Travel_Frequently" { 0.6 } else { 0.0 }
        - 0.00015 * (income as f64 - 6500.0)
        - 0.04 * (age as f64 - 36.0);
    let attrition = rng.gen::<f64>() < 1.0 / (1.0 + (-logit).exp());

    let mut row = FxHashMap::default();
    let mut put = |name: &'static str, value: String| {
        row.insert(name, value);
    };
    put("Age", age.to_string());
    put("Attrition", if attrition { "Yes" } else { "No" }.into());
    put("BusinessTravel", travel.into());
    put("DailyRate", rng.gen_range(102..1500).to_string());
    put("Department", department.into());
    put("DistanceFromHome", rng.gen_range(1..30).to_string());
    put("Education", rng.gen_range(1..=5).to_string());
    put("EducationField", FIELDS.choose(rng).unwrap().to_string());
    put("EmployeeCount", "1".into());
    put("EmployeeNumber", (index + 1).to_string());
    put("EnvironmentSatisfaction", rng.gen_range(1..=4).to_string());
    put("Gender", if rng.gen_bool(0.6) { "Male" } else { "Female" }.into());
    put("HourlyRate", rng.gen_range(30..=100).to_string());
    put("JobInvolvement", rng.gen_range(1..=4).to_string());
    put("JobLevel", job_level.to_string());
    put("JobRole", role.into());
    put("JobSatisfaction", job_satisfaction.to_string());
    put("MaritalStatus", marital.into());
    put("MonthlyIncome", income.to_string());
    put("MonthlyRate", rng.gen_range(2094..27000).to_string());
    put("NumCompaniesWorked", rng.gen_range(0..10).to_string());
    put("Over18", "Y".into());
    put("OverTime", if overtime { "Yes" } else { "No" }.into());
    put("PercentSalaryHike", rng.gen_range(11..=25).to_string());
    put("PerformanceRating", if rng.gen_bool(0.15) { "4" } else { "3" }.into());
    put("RelationshipSatisfaction", rng.gen_range(1..=4).to_string());
    put("StandardHours", "80".into());
    put("StockOptionLevel", rng.gen_range(0..=3).to_string());
    put("TotalWorkingYears", total_years.to_string());
    put("TrainingTimesLastYear", rng.gen_range(0..=6).to_string());
    put("WorkLifeBalance", rng.gen_range(1..=4).to_string());
    put("YearsAtCompany", years_at_company.to_string());
    put("YearsInCurrentRole", rng.gen_range(0..=years_at_company).to_string());
    put("YearsSinceLastPromotion", rng.gen_range(0..=years_at_company).to_string());
    put("YearsWithCurrManager", rng.gen_range(0..=years_at_company).to_string());
    row
}
