use std::sync::Arc;

use vista_core::{DataSource, FetchHandle, Filter, ListController, QuerySpec};
use vista_model::{Competency, Section};

use super::SectionContext;
use crate::render::{badge, render_view};

pub const SECTION: Section = "competencies";

/// Read-only competency map: largest gaps first.
pub struct CompetenciesSection {
    controller: ListController<Competency>,
}

impl CompetenciesSection {
    pub fn new(ctx: &SectionContext, source: Arc<dyn DataSource<Competency>>) -> Self {
        let query = QuerySpec::new()
            .with_search_field(|c: &Competency| c.employee.clone())
            .with_search_field(|c: &Competency| c.name.clone())
            .with_sort(|a: &Competency, b: &Competency| b.gap().cmp(&a.gap()));
        Self {
            controller: ctx.controller(SECTION, source, query, None),
        }
    }

    pub fn controller(&self) -> &ListController<Competency> {
        &self.controller
    }

    pub fn load(&self) -> FetchHandle {
        self.controller.load()
    }

    pub fn filter_employee(&self, employee: Option<&str>) {
        let employee = employee.map(str::to_string);
        self.controller.update_query(|q| {
            q.with_filter("employee", Filter::eq_by(employee, |c: &Competency| c.employee.clone()))
        });
    }

    pub fn only_gaps(&self, on: bool) {
        self.controller.update_query(|q| {
            if on {
                q.with_predicate("gap", |c: &Competency| c.gap() > 0)
            } else {
                q.with_any("gap")
            }
        });
    }

    /// Mean coverage over every loaded competency, `None` until loaded or when empty.
    pub fn average_coverage(&self) -> Option<u8> {
        let items = self.controller.items().ok()?;
        if items.is_empty() {
            return None;
        }
        let sum: u32 = items.iter().map(|c| u32::from(c.coverage())).sum();
        u8::try_from(sum / items.len() as u32).ok()
    }

    pub fn render(&self, color: bool) -> Vec<String> {
        render_view("Competencies", &self.controller.view(), |c| {
            format!(
                "{} {} · {} · level {}/{} · coverage {}%",
                badge(c.tone(), &format!("gap {}", c.gap()), color),
                c.employee,
                c.name,
                c.current,
                c.required,
                c.coverage()
            )
        })
    }
}
