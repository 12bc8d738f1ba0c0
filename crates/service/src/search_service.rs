use std::sync::Arc;

use noticeboard_core::{Record, RecordKind};
use noticeboard_search::{MatchMode, NoticeFilter, Page, SearchQuery, search_documents};
use noticeboard_storage::RecordStore;
use serde::Serialize;

use crate::ServiceError;

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub mode: MatchMode,
    pub filter: NoticeFilter,
    pub page: Page,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticeHit {
    pub id: String,
    pub score: f32,
    pub record: Record,
}

/// Ranked search over stored notices.
pub struct SearchService {
    store: Arc<dyn RecordStore>,
}

impl SearchService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<NoticeHit>, ServiceError> {
        let query = SearchQuery::parse(&request.query, request.mode).map_err(ServiceError::Search)?;
        let notices = self.store.list(RecordKind::Notice.as_str()).await?;
        let candidates: Vec<_> = notices
            .iter()
            .filter(|stored| request.filter.matches(&stored.record))
            .filter_map(|stored| stored.document.as_ref().map(|doc| (stored.id.as_str(), doc)))
            .collect();

        let hits = search_documents(candidates, &query, request.page);
        tracing::debug!(query = query.text(), hits = hits.len(), "notice search");

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let stored = notices.iter().find(|s| s.id == hit.id)?;
                Some(NoticeHit { id: hit.id, score: hit.score, record: stored.record.clone() })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use noticeboard_core::{EngineConfig, MutationPipeline, SchemaRegistry, into_record};
    use noticeboard_storage::InMemoryStore;
    use serde_json::json;

    use super::*;
    use crate::RecordService;

    async fn seeded() -> (RecordService, SearchService) {
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
        let registry = Arc::new(SchemaRegistry::builtin(&EngineConfig::default()));
        let records = RecordService::new(Arc::clone(&store), MutationPipeline::new(registry));
        let notices = [
            ("engineering", "국가장학금 신청 안내", vec!["#장학"]),
            ("music", "장학 공지", vec!["#장학", "#학사"]),
            ("engineering", "기숙사 입사 안내", vec!["#기숙사"]),
        ];
        for (i, (college, title, tags)) in notices.into_iter().enumerate() {
            let record = into_record(json!({
                "college_key": college,
                "title": title,
                "url": format!("https://example.ac.kr/notice/{i}"),
                "hashtags_ai": tags
            }))
            .unwrap();
            records.create("notice", record).await.unwrap();
        }
        (records, SearchService::new(store))
    }

    fn request(query: &str) -> SearchRequest {
        SearchRequest { query: query.to_owned(), ..SearchRequest::default() }
    }

    #[tokio::test]
    async fn title_match_outranks_hashtag_match() {
        let (_, search) = seeded().await;
        let hits = search.search(&request("장학")).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record["title"], json!("장학 공지"));
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn filters_apply_before_ranking() {
        let (_, search) = seeded().await;
        let mut req = request("장학");
        req.filter = NoticeFilter::new().college("engineering");
        let hits = search.search(&req).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record["college_key"], json!("engineering"));

        req.filter = NoticeFilter::new().hashtags(&["#학사"]);
        assert_eq!(search.search(&req).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn synonyms_find_college_notices() {
        let (_, search) = seeded().await;
        let mut req = request("공대 안내");
        req.mode = MatchMode::All;
        assert_eq!(search.search(&req).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_query_is_a_search_error() {
        let (_, search) = seeded().await;
        let err = search.search(&request("  '; ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Search(_)));
    }
}
