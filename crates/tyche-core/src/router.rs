//! Static host → lane-order routing.

use crate::lanes::LaneId;
use crate::rules::{AdapterRegistry, normalize_host};

use LaneId::*;

/// National game sites serve clean JSON APIs.
const JSON_FIRST: &[LaneId] = &[DirectJson, JsonMining, EmbeddedJson, RenderedText, Vision];

/// Single-game sites with ASMX endpoints and server-rendered fallbacks.
const ASMX_THEN_MARKUP: &[LaneId] = &[DirectJson, EmbeddedJson, AdapterRules, RenderedText, Vision];

/// State lottery pages list several games in rendered HTML.
const MARKUP_FIRST: &[LaneId] = &[AdapterRules, JsonMining, EmbeddedJson, RenderedText, Vision];

const DEFAULT: &[LaneId] = &[JsonMining, EmbeddedJson, RenderedText];

const ROUTES: &[(&str, &[LaneId])] = &[
    ("powerball.com", JSON_FIRST),
    ("megamillions.com", JSON_FIRST),
    ("luckyforlife.us", ASMX_THEN_MARKUP),
    ("lottoamerica.com", ASMX_THEN_MARKUP),
    ("cash4lifelottery.net", ASMX_THEN_MARKUP),
    ("walottery.com", MARKUP_FIRST),
    ("mdlottery.com", MARKUP_FIRST),
    ("rilot.com", MARKUP_FIRST),
];

/// Maps a capture host to the ordered lanes tried for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceRouter;

impl SourceRouter {
    pub fn new() -> Self {
        Self
    }

    /// Lane order for `host`. Subdomains of a routed host share its route.
    /// A host with adapter rules always gets the adapter lane, ahead of the
    /// rendered-text scan when its route does not already place it.
    pub fn route(&self, host: &str, adapters: &AdapterRegistry) -> Vec<LaneId> {
        let host = normalize_host(host);
        let mut lanes = Self::specialized(&host).unwrap_or(DEFAULT).to_vec();
        if adapters.has_rules(&host) && !lanes.contains(&AdapterRules) {
            let at = lanes
                .iter()
                .position(|l| *l == RenderedText)
                .unwrap_or(lanes.len());
            lanes.insert(at, AdapterRules);
        }
        lanes
    }

    fn specialized(host: &str) -> Option<&'static [LaneId]> {
        ROUTES
            .iter()
            .find(|(key, _)| {
                host == *key
                    || host
                        .strip_suffix(key)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
            .map(|(_, lanes)| *lanes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::AdapterRule;

    #[test]
    fn test_default_route() {
        let router = SourceRouter::new();
        assert_eq!(
            router.route("example.org", &AdapterRegistry::empty()),
            vec![JsonMining, EmbeddedJson, RenderedText]
        );
    }

    #[test]
    fn test_specialized_routes_ignore_case_and_www() {
        let router = SourceRouter::new();
        let none = AdapterRegistry::empty();
        assert_eq!(router.route("WWW.Powerball.com", &none)[0], DirectJson);
        assert_eq!(router.route("www.mdlottery.com", &none)[0], AdapterRules);
        assert_eq!(router.route("lottoamerica.com:443", &none)[2], AdapterRules);
    }

    #[test]
    fn test_subdomain_matches_but_lookalike_does_not() {
        let router = SourceRouter::new();
        let none = AdapterRegistry::empty();
        assert_eq!(router.route("api.megamillions.com", &none), JSON_FIRST.to_vec());
        assert_eq!(router.route("notmegamillions.com", &none), DEFAULT.to_vec());
    }

    #[test]
    fn test_unknown_host_with_rules_gets_adapter_lane() {
        let router = SourceRouter::new();
        let rules = AdapterRegistry::new([AdapterRule {
            host: "www.palottery.com".into(),
            game: "Cash4Life".into(),
            ..Default::default()
        }]);
        assert_eq!(
            router.route("palottery.com", &rules),
            vec![JsonMining, EmbeddedJson, AdapterRules, RenderedText]
        );
    }

    #[test]
    fn test_specialized_host_with_rules_gets_adapter_lane() {
        let router = SourceRouter::new();
        let rules = AdapterRegistry::new([
            AdapterRule {
                host: "powerball.com".into(),
                game: "Powerball".into(),
                ..Default::default()
            },
            AdapterRule {
                host: "mdlottery.com".into(),
                game: "Cash4Life".into(),
                ..Default::default()
            },
        ]);
        assert_eq!(
            router.route("www.powerball.com", &rules),
            vec![DirectJson, JsonMining, EmbeddedJson, AdapterRules, RenderedText, Vision]
        );
        assert_eq!(router.route("megamillions.com", &rules), JSON_FIRST.to_vec());
        // already routed to the adapter lane, so it is not added twice
        assert_eq!(router.route("mdlottery.com", &rules), MARKUP_FIRST.to_vec());
    }

    #[test]
    fn test_every_route_ends_in_text_or_vision() {
        for (_, lanes) in ROUTES {
            assert!(lanes.contains(&RenderedText));
        }
    }
}
