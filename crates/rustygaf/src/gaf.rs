//! GAF composition root
//!
//! Builds the modules selected at construction time and hands them out. A module
//! that was not configured stays absent for the lifetime of the instance.

use crate::bap::{Bap, BapConfig};
use crate::error::{GafError, GafResult};
use crate::iap::{IapConfig, IapManager};
use crate::msg::Message;
use crate::tbs::{TbsConfig, TbsServer};
use bitflags::bitflags;
use log::{info, warn};

bitflags! {
    /// Modules built by a `Gaf` instance
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u8 {
        const IAP = 0x01;
        const TBS = 0x02;
        const BAP = 0x04;
    }
}

/// Modules to build. `None` leaves a module out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GafConfig {
    pub iap: Option<IapConfig>,
    pub tbs: Option<TbsConfig>,
    pub bap: Option<BapConfig>,
}

/// Generic Audio Framework instance
#[derive(Debug)]
pub struct Gaf {
    iap: Option<IapManager>,
    tbs: Option<TbsServer>,
    bap: Option<Bap>,
}

impl Gaf {
    /// Build and configure every module present in `config`
    pub fn new(config: GafConfig) -> GafResult<Self> {
        let iap = config.iap.map(IapManager::new).transpose()?;
        let tbs = match config.tbs {
            Some(tbs_config) => {
                let mut tbs = TbsServer::new();
                tbs.configure(tbs_config)?;
                Some(tbs)
            }
            None => None,
        };
        let bap = match config.bap {
            Some(bap_config) => {
                let mut bap = Bap::new();
                bap.configure(bap_config)?;
                Some(bap)
            }
            None => None,
        };

        let gaf = Self { iap, tbs, bap };
        info!("GAF started with features {:?}", gaf.features());
        Ok(gaf)
    }

    /// Modules that were built
    pub fn features(&self) -> Features {
        let mut features = Features::empty();
        features.set(Features::IAP, self.iap.is_some());
        features.set(Features::TBS, self.tbs.is_some());
        features.set(Features::BAP, self.bap.is_some());
        features
    }

    pub fn iap(&self) -> GafResult<&IapManager> {
        self.iap.as_ref().ok_or(GafError::FeatureDisabled("IAP"))
    }

    pub fn iap_mut(&mut self) -> GafResult<&mut IapManager> {
        self.iap.as_mut().ok_or(GafError::FeatureDisabled("IAP"))
    }

    pub fn tbs(&self) -> GafResult<&TbsServer> {
        self.tbs.as_ref().ok_or(GafError::FeatureDisabled("TBS"))
    }

    pub fn tbs_mut(&mut self) -> GafResult<&mut TbsServer> {
        self.tbs.as_mut().ok_or(GafError::FeatureDisabled("TBS"))
    }

    pub fn bap(&self) -> GafResult<&Bap> {
        self.bap.as_ref().ok_or(GafError::FeatureDisabled("BAP"))
    }

    pub fn bap_mut(&mut self) -> GafResult<&mut Bap> {
        self.bap.as_mut().ok_or(GafError::FeatureDisabled("BAP"))
    }

    /// Pending indications of every module, encoded for the message bus.
    ///
    /// Each module keeps its own order. Modules are drained one after the other.
    /// An event that cannot be encoded is logged and skipped, the others are
    /// still delivered.
    pub fn drain_messages(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Some(iap) = self.iap.as_mut() {
            messages.extend(iap.drain_events().iter().map(|event| event.to_message()));
        }
        if let Some(tbs) = self.tbs.as_mut() {
            for event in tbs.drain_events() {
                match event.to_message() {
                    Ok(message) => messages.push(message),
                    Err(err) => warn!("Dropping TBS event {:?}: {}", event, err),
                }
            }
        }
        if let Some(bap) = self.bap.as_mut() {
            messages.extend(bap.drain_events().iter().map(|event| event.to_message()));
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bap::BapRoles;
    use crate::msg::{Layer, Module, GAF_ERR_FEATURE_DISABLED};
    use crate::tbs::{BearerParam, TbsChar, TbsError};

    #[test]
    fn test_only_configured_modules_are_built() {
        let mut gaf = Gaf::new(GafConfig {
            tbs: Some(TbsConfig::default()),
            ..GafConfig::default()
        })
        .unwrap();
        assert_eq!(gaf.features(), Features::TBS);
        assert!(gaf.tbs().unwrap().is_configured());
        assert_eq!(gaf.iap().err(), Some(GafError::FeatureDisabled("IAP")));
        assert_eq!(
            gaf.bap_mut().err().map(|err| err.code()),
            Some(Layer::Common.status(GAF_ERR_FEATURE_DISABLED))
        );
    }

    #[test]
    fn test_all_modules() {
        let gaf = Gaf::new(GafConfig {
            iap: Some(IapConfig::default()),
            tbs: Some(TbsConfig::default()),
            bap: Some(BapConfig::all_roles()),
        })
        .unwrap();
        assert_eq!(gaf.features(), Features::all());
        assert_eq!(gaf.bap().unwrap().roles(), BapRoles::all());
    }

    #[test]
    fn test_invalid_module_configuration() {
        let result = Gaf::new(GafConfig {
            tbs: Some(TbsConfig {
                nb_tbs: 0,
                ..TbsConfig::default()
            }),
            ..GafConfig::default()
        });
        assert!(matches!(
            result,
            Err(GafError::Tbs(TbsError::InvalidParam(_)))
        ));

        let result = Gaf::new(GafConfig {
            bap: Some(BapConfig::default()),
            ..GafConfig::default()
        });
        assert!(matches!(result, Err(GafError::Bap(_))));
    }

    #[test]
    fn test_drain_messages() {
        let mut gaf = Gaf::new(GafConfig {
            tbs: Some(TbsConfig::default()),
            bap: Some(BapConfig::all_roles()),
            ..GafConfig::default()
        })
        .unwrap();
        let tbs = gaf.tbs_mut().unwrap();
        let bearer_lid = tbs.add(BearerParam::default()).unwrap();
        let call_id = tbs.call_incoming(bearer_lid, "tel:123", None, None).unwrap();
        tbs.cp_write(0, bearer_lid, &[crate::tbs::TBS_OPCODE_TERMINATE, call_id])
            .unwrap();

        let modules: Vec<Option<Module>> = gaf
            .drain_messages()
            .iter()
            .map(|message| message.code.module())
            .collect();
        assert_eq!(
            modules,
            vec![Some(Module::AccTbs), Some(Module::AccTbs), Some(Module::Bap)]
        );
        assert!(gaf.drain_messages().is_empty());
    }

    #[test]
    fn test_drain_messages_with_long_current_calls() {
        let mut gaf = Gaf::new(GafConfig {
            tbs: Some(TbsConfig::default()),
            ..GafConfig::default()
        })
        .unwrap();
        let tbs = gaf.tbs_mut().unwrap();
        let bearer_lid = tbs.add(BearerParam::default()).unwrap();
        tbs.set_cli_cfg(0, bearer_lid, TbsChar::CurrentCalls, true)
            .unwrap();
        let uri = format!("tel:{}", "1".repeat(60));
        for _ in 0..4 {
            tbs.call_incoming(bearer_lid, &uri, None, None).unwrap();
        }

        let messages = gaf.drain_messages();
        assert_eq!(messages.len(), 4);
        // con, bearer, characteristic, then a u16 length
        let last = &messages[3].payload;
        assert_eq!(last[2], TbsChar::CurrentCalls as u8);
        assert_eq!(u16::from_le_bytes([last[3], last[4]]), 272);
        assert_eq!(last.len(), 5 + 272);
        assert_eq!(gaf.tbs().unwrap().nb_calls(), 4);
        assert!(gaf.drain_messages().is_empty());
    }
}
