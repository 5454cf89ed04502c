use crate::models::industry::Industry;
use crate::models::project::Project;

/// Sentinel token for the implicit "show everything" button in each group.
pub const ALL: &str = "all";

/// One filter dimension: either the "all" sentinel or a concrete token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Token(String),
}

impl Selection {
    pub fn from_token(token: &str) -> Self {
        if token == ALL {
            Selection::All
        } else {
            Selection::Token(token.to_string())
        }
    }
}

/// The two independent selector variables of the client-side runtime,
/// both initialized to "all". Kept DOM-free so the predicate can be
/// exercised directly.
#[derive(Debug, Clone)]
pub struct FilterState {
    pub industry: Selection,
    pub service: Selection,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            industry: Selection::All,
            service: Selection::All,
        }
    }
}

impl FilterState {
    pub fn select_industry(&mut self, token: &str) {
        self.industry = Selection::from_token(token);
    }

    pub fn select_service(&mut self, token: &str) {
        self.service = Selection::from_token(token);
    }
}

/// The filterable tokens of one rendered project card, as embedded in its
/// markup at render time.
#[derive(Debug, Clone)]
pub struct CardTokens {
    pub industries: Vec<String>,
    pub service: Option<String>,
}

impl CardTokens {
    /// `ind-<slug>` per tagged industry, `ser-<id>` for the linked service.
    /// A dangling service id still produces a token; it just never matches
    /// any filter button.
    pub fn for_project(project: &Project, industries: &[Industry]) -> Self {
        CardTokens {
            industries: industries
                .iter()
                .map(|i| format!("ind-{}", i.slug))
                .collect(),
            service: project.service_id.map(|id| format!("ser-{}", id)),
        }
    }

    /// The class attribute tokens attached to the card.
    pub fn class_tokens(&self) -> Vec<String> {
        let mut tokens = self.industries.clone();
        if let Some(ref s) = self.service {
            tokens.push(s.clone());
        }
        tokens
    }
}

/// Visibility predicate: AND across the two dimensions, "all" bypasses its
/// dimension's check entirely. Pure recomputation per evaluation, mirrored
/// exactly by the emitted client script.
pub fn matches(card: &CardTokens, state: &FilterState) -> bool {
    let industry_ok = match &state.industry {
        Selection::All => true,
        Selection::Token(t) => card.industries.iter().any(|i| i == t),
    };
    let service_ok = match &state.service {
        Selection::All => true,
        Selection::Token(t) => card.service.as_deref() == Some(t.as_str()),
    };
    industry_ok && service_ok
}

/// Client-side mirror of `matches`, emitted inline with the project grid.
/// Two selector variables, per-group active-class toggling, then one pass
/// over the fixed card list. No network calls, no re-fetch.
pub const FILTER_JS: &str = r#"
(function () {
    var activeIndustry = 'all';
    var activeService = 'all';

    function apply() {
        document.querySelectorAll('.vt-card[data-industries]').forEach(function (card) {
            var industries = (card.dataset.industries || '').split(' ').filter(Boolean);
            var service = card.dataset.service || '';
            var indOk = activeIndustry === 'all' || industries.indexOf(activeIndustry) !== -1;
            var serOk = activeService === 'all' || service === activeService;
            card.classList.toggle('vt-hidden', !(indOk && serOk));
        });
    }

    function bind(group, set) {
        document.querySelectorAll(group + ' button').forEach(function (btn) {
            btn.addEventListener('click', function () {
                set(btn.dataset.filter || 'all');
                document.querySelectorAll(group + ' button').forEach(function (b) {
                    b.classList.toggle('active', b === btn);
                });
                apply();
            });
        });
    }

    bind('.vt-filter-industries', function (t) { activeIndustry = t; });
    bind('.vt-filter-services', function (t) { activeService = t; });
})();
"#;
