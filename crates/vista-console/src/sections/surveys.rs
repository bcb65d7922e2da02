use std::sync::Arc;

use uuid::Uuid;
use vista_core::{CoreError, DataSource, FetchHandle, Filter, ListController, MutationRequest, QuerySpec};
use vista_model::{ItemId, Section, Survey, SurveyStatus};

use super::SectionContext;
use crate::{
    format::percent,
    mock::MockBackend,
    render::{badge, render_view},
};

pub const SECTION: Section = "surveys";
pub const MANAGE: &str = "surveys.manage";

fn require_title(survey: &Survey) -> Result<(), CoreError> {
    if survey.title.trim().is_empty() {
        return Err(CoreError::validation("title", "Title is required"));
    }
    Ok(())
}

pub struct SurveysSection {
    controller: ListController<Survey>,
    backend: Arc<MockBackend>,
}

impl SurveysSection {
    pub fn new(ctx: &SectionContext, source: Arc<dyn DataSource<Survey>>) -> Self {
        let query = QuerySpec::new().with_search_field(|s: &Survey| s.title.clone());
        Self {
            controller: ctx.controller(SECTION, source, query, None),
            backend: Arc::clone(&ctx.backend),
        }
    }

    pub fn controller(&self) -> &ListController<Survey> {
        &self.controller
    }

    pub fn load(&self) -> FetchHandle {
        self.controller.load()
    }

    pub fn filter_status(&self, status: Option<SurveyStatus>) {
        self.controller
            .update_query(|q| q.with_filter("status", Filter::eq_by(status, |s: &Survey| s.status)));
    }

    pub fn can_manage(&self, subject: &str) -> bool {
        self.controller.can_mutate(subject, MANAGE)
    }

    /// Create a survey; it starts active when anyone is invited, as a draft otherwise.
    pub async fn create(&self, title: &str, invited: u32) -> Result<Survey, CoreError> {
        let survey = Survey {
            id: ItemId::new(format!("sv-{}", Uuid::new_v4().simple())),
            title: title.trim().to_string(),
            status: if invited == 0 {
                SurveyStatus::Draft
            } else {
                SurveyStatus::Active
            },
            invited,
            responses: 0,
            enps: None,
        };
        self.controller
            .create(survey, require_title, |_| self.backend.persist(SECTION))
            .await
    }

    /// Stop collecting responses. Only active surveys can be closed.
    pub async fn close(&self, id: &ItemId) -> Result<Survey, CoreError> {
        let request = MutationRequest::new(id.clone(), "Close survey", |s: &Survey| Survey {
            status: match s.status {
                SurveyStatus::Active => SurveyStatus::Closed,
                other @ (SurveyStatus::Draft | SurveyStatus::Closed) => other,
            },
            ..s.clone()
        })
        .with_check(|s: &Survey| match s.status {
            SurveyStatus::Closed => Ok(()),
            SurveyStatus::Draft | SurveyStatus::Active => Err(CoreError::validation(
                "status",
                "Only active surveys can be closed",
            )),
        });

        self.controller
            .dispatch(request, |_| self.backend.persist(SECTION))
            .await
    }

    pub fn render(&self, color: bool) -> Vec<String> {
        render_view("Surveys", &self.controller.view(), |s| {
            let rate = s.response_rate().map_or_else(|| "n/a".to_string(), percent);
            let enps = match (s.enps, s.enps_band()) {
                (Some(score), Some(band)) => {
                    format!("eNPS {score:+} {}", badge(band.tone(), band.label(), color))
                }
                _ => "eNPS pending".to_string(),
            };
            format!(
                "{} {} · responses {rate} · {enps}",
                badge(s.status.tone(), s.status.label(), color),
                s.title
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vista_model::EnpsBand;

    use super::*;
    use crate::{
        mock::{MockSource, surveys},
        sections::testing::fixture,
    };

    fn section(fx: &crate::sections::testing::Fixture) -> SurveysSection {
        let source = Arc::new(MockSource::new(SECTION, surveys().unwrap(), Duration::from_millis(100)));
        SurveysSection::new(&fx.ctx, source)
    }

    #[tokio::test(start_paused = true)]
    async fn create_requires_title() {
        let fx = fixture();
        let surveys = section(&fx);
        surveys.load().wait().await;

        let err = surveys.create("   ", 10).await.unwrap_err();
        assert_eq!(err, CoreError::validation("title", "Title is required"));
        assert_eq!(surveys.controller().items().unwrap().len(), 5);
        assert!(fx.notes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn create_prepends_new_survey() {
        let fx = fixture();
        let surveys = section(&fx);
        surveys.load().wait().await;

        let created = surveys.create(" Exit interviews ", 12).await.unwrap();
        assert_eq!(created.title, "Exit interviews");
        assert_eq!(created.status, SurveyStatus::Active);

        let items = surveys.controller().items().unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].id, created.id);

        let draft = surveys.create("Benefits 2025", 0).await.unwrap();
        assert_eq!(draft.status, SurveyStatus::Draft);
    }

    #[tokio::test(start_paused = true)]
    async fn only_active_surveys_close() {
        let fx = fixture();
        let surveys = section(&fx);
        surveys.load().wait().await;

        let closed = surveys.close(&ItemId::from("sv-onboarding")).await.unwrap();
        assert_eq!(closed.status, SurveyStatus::Closed);

        let err = surveys.close(&ItemId::from("sv-benefits")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "status", .. }));

        let err = surveys.close(&ItemId::from("sv-missing")).await.unwrap_err();
        assert_eq!(err, CoreError::NotFound(ItemId::from("sv-missing")));
    }

    #[tokio::test(start_paused = true)]
    async fn rendering_shows_rate_and_band() {
        let fx = fixture();
        let surveys = section(&fx);
        surveys.load().wait().await;
        surveys.filter_status(Some(SurveyStatus::Closed));

        let lines = surveys.render(false);
        assert_eq!(lines[0], "Surveys (2)");
        assert_eq!(
            lines[1],
            "[+] Closed Q1 Engagement Pulse · responses 84% · eNPS +34 [+] Favorable"
        );
        assert!(lines[2].contains("eNPS +12 [~] Neutral"));
    }

    #[test]
    fn enps_bands() {
        assert_eq!(EnpsBand::from_score(-8), EnpsBand::Critical);
        assert_eq!(EnpsBand::from_score(0), EnpsBand::Neutral);
        assert_eq!(EnpsBand::from_score(30), EnpsBand::Favorable);
    }
}
