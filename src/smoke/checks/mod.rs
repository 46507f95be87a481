//! Check groups in run order. Only login can abort the run.

mod admin;
mod basics;
mod crud;
mod menus;
mod platform;
mod public;
mod theme;
mod uploads;

use tracing::error;

use super::suite::SmokeSuite;

pub async fn run_all(suite: &mut SmokeSuite) {
	if !basics::login(suite).await {
		error!("login failed, aborting smoke run");
		return;
	}

	basics::health(suite).await;
	basics::reads(suite).await;
	basics::admin_images(suite).await;
	basics::token(suite).await;
	crud::flows(suite).await;
	crud::existing_items(suite).await;
	platform::tenancy(suite).await;
	platform::relations(suite).await;
	platform::notifications(suite).await;
	platform::settings(suite).await;
	platform::kitchen(suite).await;
	platform::filtering(suite).await;
	platform::bulk(suite).await;
	public::routes(suite).await;
	public::twilio(suite).await;
	public::error_handling(suite).await;
	public::consistency(suite).await;
	public::load(suite).await;
	uploads::images(suite).await;
	menus::product_tags(suite).await;
	menus::selection(suite).await;
	theme::display_and_theme(suite).await;
	admin::relations(suite).await;
	admin::statistics(suite).await;
	basics::logout(suite).await;
}

/// Id of the first item a list call returns.
fn first_id(body: &crate::client::Body) -> Option<String> {
	body.items()?
		.first()?
		.get("id")?
		.as_str()
		.filter(|id| !id.is_empty())
		.map(str::to_string)
}
