//! Remote data fetch over HTTP.
//!
//! One bounded GET per payload, parsed by the core crate. Every
//! failure mode degrades to a sentinel result (empty forecast, epoch
//! time) so a bad refresh can never stall or crash the display loop.

use defmt::{info, warn};
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_time::{Duration, with_timeout};
use pico_weather_core::clock::parse_time;
use pico_weather_core::forecast::parse_forecast;
use pico_weather_core::model::{CalendarTime, Forecast};
use reqwless::client::HttpClient;
use reqwless::request::{Method, RequestBuilder};

use crate::config::{FETCH_TIMEOUT_SECS, FORECAST_URL, TIME_URL, USER_AGENT};
use crate::connectivity::Connectivity;

/// Response bodies land here; met.no compact payloads run tens of KiB.
pub const FETCH_BUFFER_SIZE: usize = 65_536;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
enum FetchError {
    /// Connectivity could not be activated.
    NotConnected,
    /// Request could not be created or sent.
    Request,
    /// The whole exchange outran its window.
    Timeout,
    /// Non-200 response.
    Status(u16),
    /// The body exceeded the fetch buffer. The no-alloc counterpart of
    /// running out of memory mid-refresh: logged, refresh skipped.
    BufferFull,
    /// Body could not be read.
    Body,
}

pub struct Fetcher {
    buffer: &'static mut [u8; FETCH_BUFFER_SIZE],
}

impl Fetcher {
    pub fn new(buffer: &'static mut [u8; FETCH_BUFFER_SIZE]) -> Self {
        Self { buffer }
    }

    /// Fetch and parse the forecast, empty on any failure. The caller
    /// holds on to its previous entries when this comes back empty.
    pub async fn fetch_forecast(&mut self, connectivity: &mut Connectivity) -> Forecast {
        match self.get(connectivity, FORECAST_URL).await {
            Ok(len) => {
                let forecast = parse_forecast(&self.buffer[..len]);
                if forecast.is_empty() {
                    warn!("forecast body did not parse");
                } else {
                    info!("forecast refreshed, {} entries", forecast.len());
                }
                forecast
            }
            Err(err) => {
                warn!("forecast fetch failed: {}", err);
                Forecast::new()
            }
        }
    }

    /// Fetch the remote time as a local calendar tuple, epoch sentinel
    /// on failure. Used once at startup to warm-start the RTC.
    pub async fn fetch_time(&mut self, connectivity: &mut Connectivity) -> CalendarTime {
        match self.get(connectivity, TIME_URL).await {
            Ok(len) => parse_time(&self.buffer[..len]),
            Err(err) => {
                warn!("time fetch failed: {}", err);
                CalendarTime::EPOCH
            }
        }
    }

    /// One GET with fixed headers into the fetch buffer, bounded by the
    /// fetch window. Returns the body length.
    async fn get(&mut self, connectivity: &mut Connectivity, url: &str) -> Result<usize, FetchError> {
        if !connectivity.activate().await {
            return Err(FetchError::NotConnected);
        }
        let stack = connectivity.stack();
        let buffer = &mut self.buffer[..];

        with_timeout(Duration::from_secs(FETCH_TIMEOUT_SECS), async move {
            let client_state = TcpClientState::<1, 4096, 4096>::new();
            let tcp_client = TcpClient::new(stack, &client_state);
            let dns_client = DnsSocket::new(stack);
            let mut http_client = HttpClient::new(&tcp_client, &dns_client);

            info!("GET {}", url);
            let mut request = http_client
                .request(Method::GET, url)
                .await
                .map_err(|_| FetchError::Request)?
                .headers(&[("User-Agent", USER_AGENT), ("Accept", "application/json")]);

            let response = request.send(buffer).await.map_err(|_| FetchError::Request)?;
            if response.status.0 != 200 {
                return Err(FetchError::Status(response.status.0));
            }

            let body = response.body().read_to_end().await.map_err(|err| match err {
                reqwless::Error::BufferTooSmall => FetchError::BufferFull,
                _ => FetchError::Body,
            })?;
            Ok(body.len())
        })
        .await
        .map_err(|_| FetchError::Timeout)?
    }
}
