use server_api::ApiContext;

use crate::views::Views;

pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) views: Views,
}
