use persona_protocol::{Track, TrackId, TrackMap};

/// Opening questions asked when a track starts
pub fn default_questions(track: TrackId) -> Vec<String> {
    let questions: &[&str] = match track {
        TrackId::Academic => &[
            "Which class changed how you think, and why?",
            "Tell me about a problem you could not put down.",
            "What do you study when nobody assigns it?",
        ],
        TrackId::Activities => &[
            "Where do you spend your time outside class?",
            "Describe a moment when something you built or organised went wrong.",
            "What role do you usually end up playing in a group?",
        ],
        TrackId::Values => &[
            "What is something you changed your mind about?",
            "When have you stood up for someone or something?",
            "What would your friends say you care about most?",
        ],
        TrackId::Future => &[
            "What do you want to be doing in ten years?",
            "Which problem in the world would you most like to work on?",
            "What do you hope to find in your next community?",
        ],
    };
    questions.iter().map(|q| q.to_string()).collect()
}

/// Every enumerated track, `not_started`, with its default questions
pub fn default_tracks() -> TrackMap {
    TrackId::ALL
        .into_iter()
        .map(|id| (id, Track::new(id, default_questions(id))))
        .collect()
}

/// Fill in tracks the snapshot did not mention
pub fn complete_tracks(mut tracks: TrackMap) -> TrackMap {
    for id in TrackId::ALL {
        tracks
            .entry(id)
            .or_insert_with(|| Track::new(id, default_questions(id)));
    }
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_protocol::TrackStatus;

    #[test]
    fn test_default_tracks_cover_enumeration() {
        let tracks = default_tracks();
        assert_eq!(tracks.len(), TrackId::ALL.len());
        assert!(tracks
            .values()
            .all(|t| t.status == TrackStatus::NotStarted && !t.questions.is_empty()));
    }

    #[test]
    fn test_complete_tracks_keeps_existing() {
        let mut partial = TrackMap::new();
        let mut values = Track::new(TrackId::Values, vec!["custom".to_string()]);
        values.status = TrackStatus::Completed;
        partial.insert(TrackId::Values, values.clone());

        let tracks = complete_tracks(partial);
        assert_eq!(tracks.len(), 4);
        assert_eq!(tracks[&TrackId::Values], values);
    }
}
