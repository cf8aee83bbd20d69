//! End-to-end dialect tests over fixture articles.
//!
//! One representative article per publisher dialect; fetch-based dialects
//! get their per-table fragments from a canned fetcher. Expected table and
//! activation counts are literal.

use coordex_backend::pubmed::DoiResolver;
use coordex_backend::sources::{parse_article, ParseContext, SourceRegistry};
use coordex_backend::Fetcher;
use coordex_core::{CoordexError, CoordinateSpace, ParseOptions, Result};
use std::collections::HashMap;
use std::path::Path;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("missing fixture {}: {e}", path.display()))
}

/// Serves canned bodies by exact URL; anything else fails.
struct MapFetcher {
    pages: HashMap<String, String>,
}

impl MapFetcher {
    fn new(pages: &[(String, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, file)| (url.clone(), fixture(file)))
                .collect(),
        }
    }

    fn empty() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }
}

impl Fetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| CoordexError::FetchFailed(format!("no canned page for {url}")))
    }
}

struct StubDoiResolver(&'static str);

impl DoiResolver for StubDoiResolver {
    fn pmid_from_doi(&self, _doi: &str) -> Option<String> {
        Some(self.0.to_string())
    }
}

fn ctx<'a>(
    fetcher: &'a dyn Fetcher,
    doi_resolver: Option<&'a dyn DoiResolver>,
) -> ParseContext<'a> {
    ParseContext {
        fetcher,
        metadata_resolver: None,
        doi_resolver,
        options: ParseOptions::default(),
    }
}

#[test]
fn test_frontiers_article() {
    let html = fixture("frontiers.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    assert_eq!(source.name(), "Frontiers");

    let fetcher = MapFetcher::empty();
    let resolver = StubDoiResolver("23576962");
    let article =
        parse_article(source, &html, None, &ctx(&fetcher, Some(&resolver))).expect("article");

    assert_eq!(article.pmid, 23576962);
    // Five table-wraps, but the demographics and behavioral tables carry
    // no coordinates and are dropped.
    assert_eq!(article.tables.len(), 3);
    let table = &article.tables[2];
    assert_eq!(table.number.as_deref(), Some("5"));
    assert!(table.caption.is_some());
    assert_eq!(table.n_activations, 13);
    assert_eq!(article.tables[0].n_activations, 6);
    assert_eq!(article.tables[1].n_activations, 9);
    // Positions are assigned 1..N without gaps despite the dropped tables.
    let positions: Vec<usize> = article.tables.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);

    assert_eq!(article.space, CoordinateSpace::Mni);
    assert_eq!(article.neurovault_links.len(), 1);
    assert_eq!(article.neurovault_links[0].id, "457");
}

#[test]
fn test_sciencedirect_legacy_article() {
    let html = fixture("sciencedirect.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    assert_eq!(source.name(), "ScienceDirect");

    let fetcher = MapFetcher::empty();
    let article =
        parse_article(source, &html, Some("22776460"), &ctx(&fetcher, None)).expect("article");

    assert_eq!(article.tables.len(), 1);
    let table = &article.tables[0];
    assert_eq!(table.number.as_deref(), Some("1"));
    assert!(table.caption.is_some());
    assert_eq!(table.n_activations, 2);
    // The publisher's "- 35" minus-gap notation is repaired.
    assert_eq!(table.activations[0].x, Some(-35.0));
    assert_eq!(table.activations[1].z, Some(-2.0));
    assert!(table.notes.is_some());
}

#[test]
fn test_sciencedirect_modern_article() {
    let html = fixture("neuropsychologia.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    assert_eq!(source.name(), "ScienceDirect");

    let fetcher = MapFetcher::empty();
    let article =
        parse_article(source, &html, Some("29366950"), &ctx(&fetcher, None)).expect("article");

    assert_eq!(article.pmid, 29366950);
    assert_eq!(article.tables.len(), 1);
    assert_eq!(article.tables[0].n_activations, 10);
}

#[test]
fn test_plos_article() {
    let html = fixture("plosone.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    assert_eq!(source.name(), "PLoS");

    let fetcher = MapFetcher::empty();
    let resolver = StubDoiResolver("22916122");
    let article =
        parse_article(source, &html, None, &ctx(&fetcher, Some(&resolver))).expect("article");

    assert_eq!(article.tables.len(), 1);
    let table = &article.tables[0];
    assert_eq!(table.number.as_deref(), Some("1"));
    assert!(table.caption.is_some());
    // 12 regions, each reported for two experiments.
    assert_eq!(table.n_activations, 24);
    let exp1 = table
        .activations
        .iter()
        .filter(|a| a.groups == vec!["Experiment 1".to_string()])
        .count();
    let exp2 = table
        .activations
        .iter()
        .filter(|a| a.groups == vec!["Experiment 2".to_string()])
        .count();
    assert_eq!(exp1, 12);
    assert_eq!(exp2, 12);
    // Shared columns ride along into both split activations.
    assert!(table.activations.iter().all(|a| a.region.is_some()));
}

#[test]
fn test_pmc_article() {
    let html = fixture("pmc.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    assert_eq!(source.name(), "PMC");

    let fetcher = MapFetcher::empty();
    // PMID comes from the embedded citation_pmid meta tag.
    let article = parse_article(source, &html, None, &ctx(&fetcher, None)).expect("article");

    assert_eq!(article.pmid, 24386379);
    assert_eq!(article.tables.len(), 1);
    let table = &article.tables[0];
    assert_eq!(table.number.as_deref(), Some("3"));
    assert_eq!(table.n_activations, 11);
    assert_eq!(article.space, CoordinateSpace::Talairach);
}

#[test]
fn test_springer_article() {
    let html = fixture("springer.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    assert_eq!(source.name(), "Springer");

    let fetcher = MapFetcher::new(&[(
        "https://link.springer.com/article/10.1007/s00429-012-0380-y/tables/1".to_string(),
        "springer_table_1.html",
    )]);
    let resolver = StubDoiResolver("22832508");
    let article =
        parse_article(source, &html, None, &ctx(&fetcher, Some(&resolver))).expect("article");

    assert_eq!(article.pmid, 22832508);
    assert_eq!(article.tables.len(), 1);
    let table = &article.tables[0];
    assert_eq!(table.number.as_deref(), Some("1"));
    assert!(table.caption.is_some());
    assert_eq!(table.n_activations, 12);
}

#[test]
fn test_highwire_article() {
    let html = fixture("highwire.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    assert_eq!(source.name(), "HighWire");

    let base = "http://cercor.oxfordjournals.test/content/11/12/1136";
    let fetcher = MapFetcher::new(&[
        (
            format!("{base}/T1.expansion.html"),
            "highwire_T1.expansion.html",
        ),
        (
            format!("{base}/T2.expansion.html"),
            "highwire_T2.expansion.html",
        ),
        (
            format!("{base}/T3.expansion.html"),
            "highwire_T3.expansion.html",
        ),
        (
            format!("{base}/T4.expansion.html"),
            "highwire_T4.expansion.html",
        ),
        (
            format!("{base}/T5.expansion.html"),
            "highwire_T5.expansion.html",
        ),
    ]);
    let article = parse_article(source, &html, None, &ctx(&fetcher, None)).expect("article");

    assert_eq!(article.pmid, 11532885);
    assert_eq!(article.tables.len(), 5);
    let total: usize = article.tables.iter().map(|t| t.n_activations).sum();
    assert_eq!(total, 44);
    let positions: Vec<usize> = article.tables.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5]);
    assert!(article.tables.iter().all(|t| t.caption.is_some()));
    assert_eq!(article.tables[0].number.as_deref(), Some("1"));
}

#[test]
fn test_highwire_failed_fetch_loses_only_that_table() {
    let html = fixture("highwire.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");

    let base = "http://cercor.oxfordjournals.test/content/11/12/1136";
    // T3 is missing from the canned set; its fetch fails.
    let fetcher = MapFetcher::new(&[
        (
            format!("{base}/T1.expansion.html"),
            "highwire_T1.expansion.html",
        ),
        (
            format!("{base}/T2.expansion.html"),
            "highwire_T2.expansion.html",
        ),
        (
            format!("{base}/T4.expansion.html"),
            "highwire_T4.expansion.html",
        ),
        (
            format!("{base}/T5.expansion.html"),
            "highwire_T5.expansion.html",
        ),
    ]);
    let article = parse_article(source, &html, None, &ctx(&fetcher, None)).expect("article");

    assert_eq!(article.tables.len(), 4);
    let total: usize = article.tables.iter().map(|t| t.n_activations).sum();
    assert_eq!(total, 34);
    let positions: Vec<usize> = article.tables.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);
}

#[test]
fn test_reparse_is_deterministic() {
    let html = fixture("frontiers.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    let fetcher = MapFetcher::empty();
    let resolver = StubDoiResolver("23576962");
    let context = ctx(&fetcher, Some(&resolver));

    let first = parse_article(source, &html, None, &context).expect("article");
    let second = parse_article(source, &html, None, &context).expect("article");
    assert_eq!(first.pmid, second.pmid);
    assert_eq!(first.tables, second.tables);
}

#[test]
fn test_all_surviving_activations_are_valid() {
    let html = fixture("frontiers.html");
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(&html).expect("source identified");
    let fetcher = MapFetcher::empty();
    let resolver = StubDoiResolver("23576962");
    let article =
        parse_article(source, &html, None, &ctx(&fetcher, Some(&resolver))).expect("article");

    for table in &article.tables {
        assert_eq!(table.n_activations, table.activations.len());
        for activation in &table.activations {
            let (x, y, z) = (
                activation.x.expect("x"),
                activation.y.expect("y"),
                activation.z.expect("z"),
            );
            assert!(x.abs() < 100.0 && y.abs() < 100.0 && z.abs() < 100.0);
            let zeroes = [x, y, z].iter().filter(|v| **v == 0.0).count();
            assert!(zeroes <= 1);
        }
    }
}

#[test]
fn test_oup_article() {
    let html = "<html><head>\
        <meta name=\"citation_pmid\" content=\"15716474\">\
        <link href=\"https://academic.oup.com/cercor/article/15/6/730\">\
        </head><body>\
        <div class=\"table-full-width-wrap\">\
        <span class=\"label\">Table 2</span>\
        <div class=\"caption\">Peak activations for the encoding contrast.</div>\
        <table><tbody>\
        <tr><th>Region</th><th>x</th><th>y</th><th>z</th><th>t</th></tr>\
        <tr><td>Left hippocampus</td><td>-24</td><td>-18</td><td>-16</td><td>5.4</td></tr>\
        <tr><td>Right fusiform gyrus</td><td>38</td><td>-44</td><td>-22</td><td>4.8</td></tr>\
        <tr><td>Anterior cingulate</td><td>-2</td><td>28</td><td>24</td><td>4.1</td></tr>\
        </tbody></table>\
        <div class=\"footnote\">Coordinates in MNI space.</div>\
        </div>\
        <div class=\"table-full-width-wrap table-modal\">\
        <table><tbody><tr><td>duplicate modal copy</td></tr></tbody></table>\
        </div>\
        </body></html>";
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(html).expect("source identified");
    assert_eq!(source.name(), "OUP");

    let fetcher = MapFetcher::empty();
    let article = parse_article(source, html, None, &ctx(&fetcher, None)).expect("article");

    assert_eq!(article.pmid, 15716474);
    assert_eq!(article.tables.len(), 1);
    let table = &article.tables[0];
    assert_eq!(table.number.as_deref(), Some("2"));
    assert_eq!(table.n_activations, 3);
    assert!(table.notes.is_some());
}

#[test]
fn test_wiley_article() {
    let html = "<html><head>\
        <link href=\"https://onlinelibrary.wiley.com/doi/10.1002/hbm.21234\">\
        </head><body>\
        <div class=\"table\" id=\"tbl1\">\
        <header class=\"article-table-caption\">Table 1. Regions showing task effects.</header>\
        <table><tbody>\
        <tr><th>Region</th><th>Side</th><th>x</th><th>y</th><th>z</th><th>t</th></tr>\
        <tr><td>Insula</td><td>L</td><td>-34</td><td>20</td><td>2</td><td>6.0</td></tr>\
        <tr><td>Insula</td><td>R</td><td>36</td><td>22</td><td>0</td><td>5.2</td></tr>\
        <tr><td>Putamen</td><td>L</td><td>-26</td><td>4</td><td>-2</td><td>4.4</td></tr>\
        <tr><td>Thalamus</td><td>R</td><td>8</td><td>-16</td><td>6</td><td>4.0</td></tr>\
        </tbody>\
        <tfoot><tr><td colspan=\"6\">Coordinates in MNI space.</td></tr></tfoot>\
        </table>\
        </div>\
        </body></html>";
    let registry = SourceRegistry::new().expect("registry");
    let source = registry.identify(html).expect("source identified");
    assert_eq!(source.name(), "Wiley");

    let fetcher = MapFetcher::empty();
    let article = parse_article(source, html, Some("21234567"), &ctx(&fetcher, None))
        .expect("article");

    assert_eq!(article.tables.len(), 1);
    let table = &article.tables[0];
    assert_eq!(table.number.as_deref(), Some("1"));
    assert_eq!(table.n_activations, 4);
    assert!(table
        .notes
        .as_deref()
        .is_some_and(|n| n.contains("MNI space")));
    assert_eq!(table.activations[0].hemisphere.as_deref(), Some("L"));
}
