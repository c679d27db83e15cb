use isahc::{
    config::{Configurable as _, RedirectPolicy},
    AsyncReadResponseExt as _, HttpClient, Request,
};

const USER_AGENT: &str = concat!("fabler/", env!("CARGO_PKG_VERSION"));

pub(crate) fn client() -> Result<HttpClient, fabler_common::Report> {
    let client = HttpClient::builder()
        .default_header("User-Agent", USER_AGENT)
        .build()?;

    Ok(client)
}

#[tracing::instrument(err, skip_all)]
pub(crate) async fn post_json(
    client: &HttpClient,
    url: &str,
    body: Vec<u8>,
) -> Result<(u16, String), fabler_common::Report> {
    tracing::info!("requesting completion");

    let req = Request::post(url)
        .redirect_policy(RedirectPolicy::Follow)
        .header("Content-Type", "application/json")
        .body(body)?;

    let mut res = client.send_async(req).await?;

    let status = res.status().as_u16();
    let text = res.text().await?;

    Ok((status, text))
}
