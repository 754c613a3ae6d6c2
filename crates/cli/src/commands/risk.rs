//! `patternlab risk`: score a lending profile.

use super::read_json;
use patternlab_shared::fixtures::{LendingProfile, ProfileKind, lending_profile};
use patternlab_shared::{AggregateAssessment, RiskScore, aggregate};
use std::path::Path;

pub fn load_profile(
    profile: &str,
    file: Option<&Path>,
) -> Result<LendingProfile, Box<dyn std::error::Error>> {
    match file {
        Some(path) => {
            let value = read_json(path)?;
            let parsed: LendingProfile = serde_json::from_value(value)
                .map_err(|e| format!("{} is not a lending profile: {e}", path.display()))?;
            Ok(parsed)
        }
        None => {
            let kind: ProfileKind = profile.parse()?;
            Ok(lending_profile(kind))
        }
    }
}

pub fn run(profile: &str, file: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let profile = load_profile(profile, file)?;
    let scores = profile.assess();
    let assessment = aggregate(&scores, None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    println!("🏦 {} ({})", profile.company, profile.industry);
    println!("   Loan amount: ${}", profile.loan_amount);
    println!();
    print_scores(&scores);
    print_assessment(&assessment);
    Ok(())
}

fn print_scores(scores: &[RiskScore]) {
    println!("{:<18} {:>6} {:<8} {:<12}", "Risk", "Score", "Level", "Decision");
    println!("{}", "-".repeat(48));
    for s in scores {
        println!(
            "{:<18} {:>6.1} {:<8} {:<12}",
            s.risk_type.as_str(),
            s.score,
            s.level.as_str(),
            s.recommendation.as_str()
        );
        for f in &s.factors {
            println!("    - {f}");
        }
    }
    println!();
}

fn print_assessment(a: &AggregateAssessment) {
    println!("Overall score:   {:.1}", a.overall_score);
    println!("Overall level:   {}", a.overall_level);
    println!("Recommendation:  {}", a.overall_recommendation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profile_by_name() {
        let p = load_profile("LOW", None).unwrap();
        assert_eq!(p.credit.credit_rating, 780);
        assert!(load_profile("extreme", None).is_err());
    }

    #[test]
    fn profile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let json = serde_json::to_string(&lending_profile(ProfileKind::High)).unwrap();
        std::fs::write(&path, json).unwrap();
        let p = load_profile("medium", Some(&path)).unwrap();
        assert_eq!(p, lending_profile(ProfileKind::High));
    }

    #[test]
    fn file_with_wrong_shape_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, r#"{"company": "X"}"#).unwrap();
        let err = load_profile("medium", Some(&path)).unwrap_err();
        assert!(err.to_string().contains("not a lending profile"));
    }
}
