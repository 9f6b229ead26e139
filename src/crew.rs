//! Crews: sequential task pipelines over agents and tools
//!
//! A crew pairs an agent persona with the tools its tasks need and runs its
//! tasks in order, composing a user-facing text report. Crews are built
//! through an explicit registry of constructor functions, and every run is
//! wrapped with observability (start/finish logs, success/error counters,
//! duration timer).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::agents::{seo_agent, weather_agent, Agent};
use crate::config::Settings;
use crate::error::CrewError;
use crate::observability::MetricSink;
use crate::tools::{GscTool, KeywordSearchTool, KeywordStat, SortBy, Verification, WeatherTool};

/// Everything a crew constructor needs.
pub struct CrewContext {
    /// Resolved application settings
    pub settings: Settings,
    /// Metric sink shared by all tools and crews
    pub sink: Arc<dyn MetricSink>,
}

/// Inputs a crew run may consume; each crew validates the fields it needs.
#[derive(Debug, Clone)]
pub struct CrewInputs {
    /// Location for the weather crew
    pub location: Option<String>,
    /// Domain under analysis for the SEO crew
    pub domain: Option<String>,
    /// Company name checked alongside the domain
    pub company_name: Option<String>,
    /// How many keywords to fetch
    pub num_keywords: u32,
    /// Trailing window in days for Search Console data
    pub date_range_days: u32,
    /// Keyword ordering
    pub sort_by: SortBy,
}

impl Default for CrewInputs {
    fn default() -> Self {
        Self {
            location: None,
            domain: None,
            company_name: None,
            num_keywords: 10,
            date_range_days: 30,
            sort_by: SortBy::Clicks,
        }
    }
}

/// A constructed crew, ready to run.
pub struct Crew {
    name: &'static str,
    sink: Arc<dyn MetricSink>,
    kind: CrewKind,
}

enum CrewKind {
    Weather(WeatherCrew),
    Seo(SeoCrew),
}

impl Crew {
    /// The crew's registry name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the crew's tasks sequentially, with observability around the run.
    pub async fn run(&self, inputs: &CrewInputs) -> Result<String, CrewError> {
        tracing::info!(crew = self.name, "starting crew");
        let started = Instant::now();

        let result = match &self.kind {
            CrewKind::Weather(crew) => crew.run(inputs).await,
            CrewKind::Seo(crew) => crew.run(inputs).await,
        };

        let tags = [("crew", self.name)];
        match &result {
            Ok(_) => {
                self.sink.incr("crew_run_success", &tags);
                tracing::info!(crew = self.name, "crew finished successfully");
            }
            Err(e) => {
                self.sink.incr("crew_run_error", &tags);
                tracing::error!(crew = self.name, error = %e, "crew failed");
            }
        }
        self.sink
            .timing_ms("crew_run_duration_ms", started.elapsed().as_millis() as u64, &tags);
        result
    }
}

/// Constructor held in the crew registry.
pub type CrewCtor = fn(&CrewContext) -> Crew;

/// Builds the crew registry: an explicit name-to-constructor map created at
/// startup and passed around, with no global state.
pub fn build_crew_registry() -> HashMap<&'static str, CrewCtor> {
    let mut registry: HashMap<&'static str, CrewCtor> = HashMap::new();
    registry.insert("weather", |ctx| Crew {
        name: "weather",
        sink: ctx.sink.clone(),
        kind: CrewKind::Weather(WeatherCrew::new(ctx)),
    });
    registry.insert("seo", |ctx| Crew {
        name: "seo",
        sink: ctx.sink.clone(),
        kind: CrewKind::Seo(SeoCrew::new(ctx)),
    });
    registry
}

/// Resolves and constructs a crew by registry name.
pub fn create_crew(
    registry: &HashMap<&'static str, CrewCtor>,
    name: &str,
    ctx: &CrewContext,
) -> Result<Crew, CrewError> {
    registry
        .get(name)
        .map(|ctor| ctor(ctx))
        .ok_or_else(|| CrewError::UnknownCrew(name.to_string()))
}

/// Crew with a single task: report current weather for a location.
struct WeatherCrew {
    agent: Agent,
    weather: WeatherTool,
}

impl WeatherCrew {
    fn new(ctx: &CrewContext) -> Self {
        Self {
            agent: weather_agent(None),
            weather: WeatherTool::new(&ctx.settings, ctx.sink.clone()),
        }
    }

    async fn run(&self, inputs: &CrewInputs) -> Result<String, CrewError> {
        let location = inputs
            .location
            .as_deref()
            .ok_or_else(|| CrewError::InvalidInput("weather crew requires a location".to_string()))?;

        let conditions = self.weather.report(location).await?;
        Ok(render_weather_report(&self.agent.role, location, &conditions))
    }
}

/// Crew with two sequential tasks: fetch top keywords from Search Console,
/// then verify each keyword's visibility with the search tool.
struct SeoCrew {
    agent: Agent,
    gsc: GscTool,
    search: KeywordSearchTool,
}

impl SeoCrew {
    fn new(ctx: &CrewContext) -> Self {
        Self {
            agent: seo_agent(None),
            gsc: GscTool::new(&ctx.settings, ctx.sink.clone()),
            search: KeywordSearchTool::new(&ctx.settings, ctx.sink.clone()),
        }
    }

    async fn run(&self, inputs: &CrewInputs) -> Result<String, CrewError> {
        let domain = inputs
            .domain
            .as_deref()
            .ok_or_else(|| CrewError::InvalidInput("seo crew requires a domain".to_string()))?;
        let company = inputs.company_name.as_deref().ok_or_else(|| {
            CrewError::InvalidInput("seo crew requires a company name".to_string())
        })?;

        // Task 1: fetch top keywords
        let stats = self
            .gsc
            .top_keywords(domain, inputs.num_keywords, inputs.date_range_days, inputs.sort_by)
            .await?;

        if stats.is_empty() {
            return Ok(format!(
                "{}\nNo keyword data found for {} in the last {} days.",
                self.agent.role, domain, inputs.date_range_days
            ));
        }

        // Task 2: verify each keyword's visibility, in Search Console order
        let mut verifications = Vec::with_capacity(stats.len());
        for stat in &stats {
            let verification = self.search.verify(&stat.keyword, &[domain, company]).await?;
            verifications.push(verification);
        }

        Ok(render_seo_report(
            &self.agent.role,
            domain,
            company,
            inputs,
            &stats,
            &verifications,
        ))
    }
}

/// Renders the weather crew's report.
fn render_weather_report(role: &str, location: &str, conditions: &str) -> String {
    format!("{}\nCurrent weather for {}: {}", role, location, conditions)
}

/// Renders the SEO crew's report: each keyword with metrics and a
/// found/not-found mark, a visibility summary, and recommendations for
/// keywords where neither the domain nor the company surfaced.
fn render_seo_report(
    role: &str,
    domain: &str,
    company: &str,
    inputs: &CrewInputs,
    stats: &[KeywordStat],
    verifications: &[Verification],
) -> String {
    let mut report = format!(
        "{}\nSEO report for {} ({})\nTop {} keywords from Search Console \
         (last {} days, sorted by {}):\n\n",
        role,
        domain,
        company,
        stats.len(),
        inputs.date_range_days,
        inputs.sort_by
    );

    let mut missing = Vec::new();
    for (i, (stat, verification)) in stats.iter().zip(verifications).enumerate() {
        let mark = if verification.consensus_found {
            format!(
                "✓ found ({}/{} models)",
                verification.found_in_models, verification.total_models
            )
        } else {
            missing.push(stat.keyword.as_str());
            format!(
                "✗ not found ({}/{} models)",
                verification.found_in_models, verification.total_models
            )
        };
        report.push_str(&format!(
            "{:3}. {} - {} clicks, {} impressions, {}% CTR, avg position {} - {}\n",
            i + 1,
            stat.keyword,
            stat.clicks,
            stat.impressions,
            stat.ctr,
            stat.position,
            mark
        ));
    }

    let found = verifications.iter().filter(|v| v.consensus_found).count();
    let visibility = found as f64 * 100.0 / verifications.len() as f64;
    report.push_str(&format!(
        "\nVisibility: {} of {} keywords ({:.1}%)\n",
        found,
        verifications.len(),
        visibility
    ));

    if missing.is_empty() {
        report.push_str("\nAll analyzed keywords surfaced the domain in simulated results.\n");
    } else {
        report.push_str("\nRecommendations:\n");
        for keyword in missing {
            report.push_str(&format!(
                "  - \"{}\": not found in simulated search results; consider \
                 strengthening content targeting this query.\n",
                keyword
            ));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;

    fn context() -> CrewContext {
        CrewContext {
            settings: Settings::default(),
            sink: Arc::new(MemorySink::new()),
        }
    }

    fn stat(keyword: &str, clicks: u64) -> KeywordStat {
        KeywordStat {
            keyword: keyword.to_string(),
            clicks,
            impressions: clicks * 20,
            ctr: 3.5,
            position: 4.2,
        }
    }

    fn verification(keyword: &str, found_in_models: usize, total_models: usize) -> Verification {
        Verification {
            keyword: keyword.to_string(),
            targets: vec!["example.com".to_string()],
            consensus_found: found_in_models * 2 > total_models,
            found_in_models,
            total_models,
            model_results: Vec::new(),
        }
    }

    #[test]
    fn test_registry_contains_both_crews() {
        let registry = build_crew_registry();
        let mut names: Vec<&str> = registry.keys().copied().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["seo", "weather"]);
    }

    #[test]
    fn test_create_crew_rejects_unknown_names() {
        let registry = build_crew_registry();
        let ctx = context();
        let result = create_crew(&registry, "finance", &ctx);
        assert!(matches!(result, Err(CrewError::UnknownCrew(name)) if name == "finance"));
    }

    #[test]
    fn test_create_crew_builds_named_crews() {
        let registry = build_crew_registry();
        let ctx = context();
        assert_eq!(create_crew(&registry, "weather", &ctx).unwrap().name(), "weather");
        assert_eq!(create_crew(&registry, "seo", &ctx).unwrap().name(), "seo");
    }

    #[tokio::test]
    async fn test_weather_crew_requires_location() {
        let registry = build_crew_registry();
        let ctx = context();
        let crew = create_crew(&registry, "weather", &ctx).unwrap();

        let result = crew.run(&CrewInputs::default()).await;
        assert!(matches!(result, Err(CrewError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_seo_crew_requires_domain_and_company() {
        let registry = build_crew_registry();
        let ctx = context();
        let crew = create_crew(&registry, "seo", &ctx).unwrap();

        let result = crew.run(&CrewInputs::default()).await;
        assert!(matches!(result, Err(CrewError::InvalidInput(_))));

        let inputs = CrewInputs {
            domain: Some("example.com".to_string()),
            ..CrewInputs::default()
        };
        let result = crew.run(&inputs).await;
        assert!(matches!(result, Err(CrewError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_crew_failure_records_error_metric() {
        let registry = build_crew_registry();
        let sink = Arc::new(MemorySink::new());
        let ctx = CrewContext {
            settings: Settings::default(),
            sink: sink.clone(),
        };
        let crew = create_crew(&registry, "weather", &ctx).unwrap();

        let _ = crew.run(&CrewInputs::default()).await;
        assert_eq!(sink.counter_total("crew_run_error"), 1);
        assert_eq!(sink.counter_total("crew_run_success"), 0);
        assert_eq!(sink.timing_count("crew_run_duration_ms"), 1);
    }

    #[test]
    fn test_render_weather_report_includes_location_and_conditions() {
        let report = render_weather_report("Weather Reporter", "London", "Clear +9°C");
        assert!(report.contains("London"));
        assert!(report.contains("Clear +9°C"));
    }

    #[test]
    fn test_render_seo_report_marks_found_and_missing() {
        let stats = vec![stat("best coffee", 120), stat("cheap beans", 40)];
        let verifications = vec![
            verification("best coffee", 3, 4),
            verification("cheap beans", 1, 4),
        ];
        let inputs = CrewInputs::default();

        let report = render_seo_report(
            "SEO Analyst",
            "example.com",
            "Acme",
            &inputs,
            &stats,
            &verifications,
        );

        assert!(report.contains("✓ found (3/4 models)"));
        assert!(report.contains("✗ not found (1/4 models)"));
        assert!(report.contains("Visibility: 1 of 2 keywords (50.0%)"));
        assert!(report.contains("Recommendations:"));
        assert!(report.contains("\"cheap beans\""));
        assert!(!report.contains("\"best coffee\": not found"));
    }

    #[test]
    fn test_render_seo_report_all_found_has_no_recommendations() {
        let stats = vec![stat("best coffee", 120)];
        let verifications = vec![verification("best coffee", 4, 4)];
        let report = render_seo_report(
            "SEO Analyst",
            "example.com",
            "Acme",
            &CrewInputs::default(),
            &stats,
            &verifications,
        );
        assert!(!report.contains("Recommendations:"));
        assert!(report.contains("All analyzed keywords surfaced the domain"));
    }
}
