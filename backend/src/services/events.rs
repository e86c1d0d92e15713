use crate::api::{EventInfo, EventListData, EventSummary};
use crate::data::{ClosureEvent, DataLoadResult, EventCatalog, SnapshotStore};

impl From<&ClosureEvent> for EventSummary {
    fn from(event: &ClosureEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            display_name: event.display_name(),
            county: event.county.clone(),
            facility_type: event.facility_type.clone(),
            closure_year: event.closure_year,
        }
    }
}

impl From<&ClosureEvent> for EventInfo {
    fn from(event: &ClosureEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            hospital_name: event.hospital_name.clone(),
            county: event.county.clone(),
            facility_type: event.facility_type.clone(),
            closure_year: event.closure_year,
            closure_month: event.closure_month,
            reason: event.reason.clone(),
        }
    }
}

/// Event picker entries, most recent closure year first. Events closed in
/// the same year keep their catalog order.
pub fn list_events(catalog: &EventCatalog) -> EventListData {
    let mut events: Vec<EventSummary> = catalog.iter().map(EventSummary::from).collect();
    events.sort_by(|a, b| b.closure_year.cmp(&a.closure_year));
    EventListData { events }
}

/// Closure events of the store's current snapshot.
pub fn get_events(store: &SnapshotStore) -> DataLoadResult<EventListData> {
    let snapshot = store.get()?;
    Ok(list_events(&snapshot.events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_sorted_by_year_descending() {
        let catalog = EventCatalog::new(vec![
            ClosureEvent::new("Mercy", "Cumberland", 2019, 3),
            ClosureEvent::new("Inland", "Kennebec", 2023, 6),
            ClosureEvent::new("Calais", "Washington", 2019, 9),
        ]);
        let data = list_events(&catalog);

        let ids: Vec<&str> = data.events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "Inland (Kennebec, 2023)",
                "Mercy (Cumberland, 2019)",
                "Calais (Washington, 2019)",
            ]
        );
        assert_eq!(data.events[0].display_name, "Inland - Kennebec (2023)");
    }

    #[test]
    fn test_event_info_carries_closure_month() {
        let mut event = ClosureEvent::new("Mercy", "Cumberland", 2019, 3);
        event.reason = Some("Merger".to_string());
        let info = EventInfo::from(&event);
        assert_eq!(info.closure_month, 3);
        assert_eq!(info.reason.as_deref(), Some("Merger"));
        assert_eq!(info.event_id, "Mercy (Cumberland, 2019)");
    }

    #[test]
    fn test_empty_catalog() {
        assert!(list_events(&EventCatalog::default()).events.is_empty());
    }
}
