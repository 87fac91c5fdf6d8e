use server_api::ApiContext;

use crate::{render::PageRenderer, session::SessionStore};

pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) sessions: SessionStore,
    pub(crate) pages: PageRenderer,
}
