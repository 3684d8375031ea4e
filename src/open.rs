use url::Url;

use crate::common::OpenOptions;
use crate::description;
use crate::errors::OpenPortError;
use crate::search;
use crate::Gateway;

/// Progress of one `PortOpener` run.
#[derive(Debug)]
pub enum Event<'a> {
    /// A run for `port` started.
    Started { port: u16 },
    /// A gateway answered the search.
    Discovered { location: &'a Url },
    /// The WANIPConnection control url was found in the description.
    ControlUrl { control_url: &'a str },
    /// The gateway accepted the mapping.
    Mapped { port: u16, gateway: &'a Gateway },
    /// The run stopped at a stage.
    Failed { port: u16, error: &'a OpenPortError },
}

/// Receives the events of a `PortOpener` run.
pub trait Reporter {
    fn report(&self, event: Event<'_>);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: Event<'_>) {
        match event {
            Event::Started { port } => info!("Attempting to open UPnP port {}", port),
            Event::Discovered { location } => info!("Found UPnP device at {}", location),
            Event::ControlUrl { control_url } => info!("Found control URL: {}", control_url),
            Event::Mapped { port, gateway } => info!("Successfully opened UPnP port {} on {}", port, gateway),
            Event::Failed { port, error } => error!("Failed to open UPnP port {}. {}", port, error),
        }
    }
}

impl<'r, R: Reporter + ?Sized> Reporter for &'r R {
    fn report(&self, event: Event<'_>) {
        (**self).report(event)
    }
}

/// Discovers the gateway, finds its control url and maps a port, in that order.
///
/// Nothing is kept between runs, so one opener can be used any number of times.
#[derive(Debug, Clone, Default)]
pub struct PortOpener<R = LogReporter> {
    options: OpenOptions,
    reporter: R,
}

impl PortOpener<LogReporter> {
    pub fn new(options: OpenOptions) -> PortOpener<LogReporter> {
        PortOpener {
            options,
            reporter: LogReporter,
        }
    }
}

impl<R: Reporter> PortOpener<R> {
    pub fn with_reporter(options: OpenOptions, reporter: R) -> PortOpener<R> {
        PortOpener { options, reporter }
    }

    /// Forward TCP `port` on the gateway to the same port on this host.
    ///
    /// Stops at the first stage that fails; the error says which one.
    pub fn try_open(&self, port: u16) -> Result<Gateway, OpenPortError> {
        self.reporter.report(Event::Started { port });
        let result = self.run(port);
        match result {
            Ok(ref gateway) => self.reporter.report(Event::Mapped { port, gateway }),
            Err(ref error) => self.reporter.report(Event::Failed { port, error }),
        }
        result
    }

    /// Like `try_open`, reduced to success or failure.
    pub fn open(&self, port: u16) -> bool {
        self.try_open(port).is_ok()
    }

    fn run(&self, port: u16) -> Result<Gateway, OpenPortError> {
        let location = search::discover(&self.options.search)?;
        self.reporter.report(Event::Discovered { location: &location });

        let gateway = description::get_gateway(location, &self.options.http)?;
        self.reporter.report(Event::ControlUrl {
            control_url: &gateway.control_url,
        });

        gateway.add_same_port(port, &self.options.mapping, &self.options.http)?;
        Ok(gateway)
    }
}

/// Forward TCP `port_number` on the local gateway to this host with default options.
///
/// Every failure is logged and turned into `false`.
pub fn open_upnp_port(port_number: u16) -> bool {
    PortOpener::new(OpenOptions::default()).open(port_number)
}
