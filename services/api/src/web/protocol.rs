//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the app and the API server for
//! live search and screen refreshes.

use crate::web::screens::{Screen, ScreenPayload, SearchResultView};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The search input changed. Only the last query of a typing burst is executed.
    Search { query: String },

    /// The user navigated to (or pulled to refresh) a screen.
    Refresh { screen: Screen },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Results of the most recent search query.
    SearchResults { query: String, hits: Vec<SearchResultView> },

    /// A freshly reconciled screen. `seq` increases with every refresh of that screen.
    Screen {
        seq: u64,
        screen: Screen,
        payload: ScreenPayload,
    },

    /// Reports a failure to the client, which should display an error message.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let refresh: ClientMessage =
            serde_json::from_str(r#"{"type":"refresh","screen":"continue_learning"}"#).unwrap();
        assert_eq!(
            refresh,
            ClientMessage::Refresh {
                screen: Screen::ContinueLearning
            }
        );

        let search: ClientMessage = serde_json::from_str(r#"{"type":"search","query":"rust"}"#).unwrap();
        assert_eq!(
            search,
            ClientMessage::Search {
                query: "rust".to_string()
            }
        );
    }

    #[test]
    fn unknown_screens_are_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"refresh","screen":"settings"}"#).is_err());
    }

    #[test]
    fn server_errors_are_tagged() {
        let json = serde_json::to_value(ServerMessage::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "error", "message": "boom"}));
    }
}
