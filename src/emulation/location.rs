//! Location emulation.
//!
//! An [`EmulatedLocation`] presents a *mapped* view of the realm's real
//! location. Reads take the backing's current href, run it through the
//! mapping function and pick one field. Writes re-derive a full address from
//! the mapped view, pass it through the rewriting function and assign the
//! result to the backing's href.

use std::fmt;
use std::rc::Rc;

use tracing::debug;
use veneer_events::Emitter;

use crate::address::Address;
use crate::error::Result;
use crate::event::HookEvent;
use crate::hooks::{
    dispatch, variant, FragmentChange, LocationEvent, LocationRead, LocationWrite,
};
use crate::host::Receiver;

/// One component of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationField {
    Href,
    /// Scheme without the trailing colon (`https`).
    Scheme,
    /// Scheme with the trailing colon (`https:`).
    Protocol,
    Host,
    Hostname,
    Port,
    Path,
    /// Query including its `?`, or empty.
    Query,
    /// Fragment including its `#`, or empty.
    Fragment,
    Origin,
}

impl LocationField {
    pub const ALL: [LocationField; 10] = [
        LocationField::Href,
        LocationField::Scheme,
        LocationField::Protocol,
        LocationField::Host,
        LocationField::Hostname,
        LocationField::Port,
        LocationField::Path,
        LocationField::Query,
        LocationField::Fragment,
        LocationField::Origin,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LocationField::Href => "href",
            LocationField::Scheme => "scheme",
            LocationField::Protocol => "protocol",
            LocationField::Host => "host",
            LocationField::Hostname => "hostname",
            LocationField::Port => "port",
            LocationField::Path => "path",
            LocationField::Query => "query",
            LocationField::Fragment => "fragment",
            LocationField::Origin => "origin",
        }
    }

    /// Apply a write of this field to `address`. `Origin` and `Href` are not
    /// components and leave it unchanged.
    fn apply(self, address: &mut Address, value: &str) -> Result<()> {
        match self {
            LocationField::Scheme | LocationField::Protocol => address.set_scheme(value)?,
            LocationField::Host => address.set_host(value)?,
            LocationField::Hostname => address.set_hostname(value),
            LocationField::Port => address.set_port(value)?,
            LocationField::Path => address.set_path(value),
            LocationField::Query => address.set_query(value),
            LocationField::Fragment => address.set_fragment(value),
            LocationField::Href | LocationField::Origin => {}
        }
        Ok(())
    }
}

impl fmt::Display for LocationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every field of one address, as produced by a mapping function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationParts {
    pub href: String,
    pub scheme: String,
    pub protocol: String,
    pub host: String,
    pub hostname: String,
    pub port: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
    pub origin: String,
}

impl LocationParts {
    /// Decompose `href` as it stands. This is the identity mapping.
    pub fn parse(href: &str) -> Result<Self> {
        let address = Address::parse(href)?;
        Ok(Self::from(&address))
    }

    pub fn field(&self, field: LocationField) -> &str {
        match field {
            LocationField::Href => &self.href,
            LocationField::Scheme => &self.scheme,
            LocationField::Protocol => &self.protocol,
            LocationField::Host => &self.host,
            LocationField::Hostname => &self.hostname,
            LocationField::Port => &self.port,
            LocationField::Path => &self.path,
            LocationField::Query => &self.query,
            LocationField::Fragment => &self.fragment,
            LocationField::Origin => &self.origin,
        }
    }
}

impl From<&Address> for LocationParts {
    fn from(address: &Address) -> Self {
        Self {
            href: address.href(),
            scheme: address.scheme().to_string(),
            protocol: address.protocol(),
            host: address.host(),
            hostname: address.hostname().to_string(),
            port: address.port(),
            path: address.path().to_string(),
            query: address.query(),
            fragment: address.fragment(),
            origin: address.origin(),
        }
    }
}

/// The navigation object's contract.
pub trait Location {
    fn get(&self, field: LocationField) -> Result<String>;

    fn set(&self, field: LocationField, value: &str) -> Result<()>;

    fn reload(&self) -> Result<()>;

    /// Navigate to `url` without a new history entry.
    fn replace(&self, url: &str) -> Result<()>;

    fn assign(&self, url: &str) -> Result<()>;

    fn ancestor_origins(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn href(&self) -> Result<String> {
        self.get(LocationField::Href)
    }
}

/// Maps the real href to the parts the page should see.
pub type LocationMap = Rc<dyn Fn(&str) -> Result<LocationParts>>;

/// Maps an address the page navigates to into the real address.
pub type AddressRewrite = Rc<dyn Fn(&str) -> String>;

struct EmulatedMarker;

pub struct EmulatedLocation {
    backing: Rc<dyn Location>,
    map: LocationMap,
    rewrite: AddressRewrite,
    events: Rc<Emitter<LocationEvent>>,
    receiver: Receiver,
}

impl EmulatedLocation {
    pub(crate) fn new(
        backing: Rc<dyn Location>,
        map: LocationMap,
        rewrite: AddressRewrite,
        events: Rc<Emitter<LocationEvent>>,
    ) -> Self {
        Self {
            backing,
            map,
            rewrite,
            events,
            receiver: Receiver::new("Location", EmulatedMarker),
        }
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// The mapped view of the backing's current href, without emitting.
    pub fn parts(&self) -> Result<LocationParts> {
        (self.map)(&self.backing.href()?)
    }

    fn current(&self) -> Result<Address> {
        Ok(Address::parse(&self.parts()?.href)?)
    }

    /// Emit `write` for `href` and, unless a listener responds, navigate the
    /// backing to the rewritten address.
    fn commit(&self, field: LocationField, value: &str, href: String) -> Result<()> {
        let data = LocationWrite {
            field,
            value: value.to_string(),
            href,
        };
        let event = HookEvent::on_receiver(data, self.receiver.clone());
        dispatch(&self.events, variant!(LocationEvent::Write), event)?.finish(|data| {
            let target = (self.rewrite)(&data.href);
            debug!(field = %data.field, target = %target, "emulated location write");
            self.backing.set(LocationField::Href, &target)
        })
    }
}

impl Location for EmulatedLocation {
    fn get(&self, field: LocationField) -> Result<String> {
        let value = self.parts()?.field(field).to_string();
        let event = HookEvent::on_receiver(LocationRead { field, value }, self.receiver.clone());
        dispatch(&self.events, variant!(LocationEvent::Read), event)?.finish(|data| Ok(data.value))
    }

    fn set(&self, field: LocationField, value: &str) -> Result<()> {
        let current = self.current()?;
        let address = match field {
            LocationField::Origin => {
                debug!("ignoring write to emulated location origin");
                return Ok(());
            }
            LocationField::Href => current.resolve(value)?,
            _ => {
                let mut address = current.clone();
                field.apply(&mut address, value)?;
                address
            }
        };

        if field == LocationField::Fragment {
            let change = FragmentChange {
                old_href: current.href(),
                new_href: address.href(),
            };
            let event = HookEvent::on_receiver(change, self.receiver.clone());
            let event = dispatch(&self.events, variant!(LocationEvent::HashChange), event)?;
            if event.intercepted() {
                debug!("fragment change vetoed");
                return Ok(());
            }
        }

        self.commit(field, value, address.href())
    }

    fn reload(&self) -> Result<()> {
        self.backing.reload()
    }

    fn replace(&self, url: &str) -> Result<()> {
        let address = self.current()?.resolve(url)?;
        self.backing.replace(&(self.rewrite)(&address.href()))
    }

    fn assign(&self, url: &str) -> Result<()> {
        let address = self.current()?.resolve(url)?;
        self.backing.assign(&(self.rewrite)(&address.href()))
    }

    fn ancestor_origins(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

impl fmt::Display for EmulatedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            Ok(parts) => f.write_str(&parts.href),
            Err(_) => Ok(()),
        }
    }
}
