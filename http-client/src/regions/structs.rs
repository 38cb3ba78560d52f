use super::{Region, RegionBuilder};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TTL: u64 = 86400;

fn default_ttl() -> u64 {
    DEFAULT_TTL
}

/// `/v4/query` 响应体
#[derive(Debug, Clone, Deserialize)]
pub(super) struct V4ResponseBody {
    #[serde(alias = "regions")]
    hosts: Vec<V4RegionBody>,
}

#[derive(Debug, Clone, Deserialize)]
struct V4RegionBody {
    #[serde(alias = "id")]
    region: String,
    #[serde(default = "default_ttl")]
    ttl: u64,
    #[serde(default)]
    io: V4DomainsBody,
    #[serde(default)]
    up: V4DomainsBody,
    #[serde(default)]
    uc: V4DomainsBody,
    #[serde(default)]
    rs: V4DomainsBody,
    #[serde(default)]
    rsf: V4DomainsBody,
    #[serde(default)]
    api: V4DomainsBody,
    #[serde(default)]
    s3: V4DomainsBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct V4DomainsBody {
    #[serde(default)]
    domains: Vec<String>,
    #[serde(default)]
    old: Vec<String>,
    region_alias: Option<String>,
}

impl V4ResponseBody {
    /// 返回按优先级排列的区域，以及其中最短的有效期
    pub(super) fn into_regions(self) -> (Vec<Region>, Duration) {
        let ttl = self.hosts.iter().map(|host| host.ttl).min().unwrap_or(DEFAULT_TTL);
        let regions = self.hosts.into_iter().map(V4RegionBody::into_region).collect();
        (regions, Duration::from_secs(ttl))
    }
}

impl V4RegionBody {
    fn into_region(self) -> Region {
        let mut builder = Region::builder(self.region);
        macro_rules! push_domains {
            ($service:ident, $add_preferred:ident, $add_alternative:ident) => {
                for domain in self.$service.domains {
                    builder = builder.$add_preferred(domain);
                }
                for domain in self.$service.old {
                    builder = builder.$add_alternative(domain);
                }
            };
        }
        if let Some(s3_region_id) = self.s3.region_alias.as_ref() {
            builder = builder.s3_region_id(s3_region_id.to_owned());
        }
        push_domains!(up, add_up_preferred_endpoint, add_up_alternative_endpoint);
        push_domains!(io, add_io_preferred_endpoint, add_io_alternative_endpoint);
        push_domains!(uc, add_uc_preferred_endpoint, add_uc_alternative_endpoint);
        push_domains!(rs, add_rs_preferred_endpoint, add_rs_alternative_endpoint);
        push_domains!(rsf, add_rsf_preferred_endpoint, add_rsf_alternative_endpoint);
        push_domains!(api, add_api_preferred_endpoint, add_api_alternative_endpoint);
        push_domains!(s3, add_s3_preferred_endpoint, add_s3_alternative_endpoint);
        builder.build()
    }
}

/// `/v2/query` 响应体
#[derive(Debug, Clone, Deserialize)]
pub(super) struct V2ResponseBody {
    #[serde(default = "default_ttl")]
    ttl: u64,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    io: V2ServiceBody,
    #[serde(default)]
    up: V2ServiceBody,
    #[serde(default)]
    uc: V2ServiceBody,
    #[serde(default)]
    rs: V2ServiceBody,
    #[serde(default)]
    rsf: V2ServiceBody,
    #[serde(default)]
    api: V2ServiceBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct V2ServiceBody {
    #[serde(default)]
    acc: V2DomainsBody,
    #[serde(default)]
    src: V2DomainsBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct V2DomainsBody {
    #[serde(default)]
    main: Vec<String>,
    #[serde(default)]
    backup: Vec<String>,
}

impl V2ResponseBody {
    /// 返回唯一的区域和它的有效期
    ///
    /// 启用加速上传时，上传服务的加速域名排在普通域名之前
    pub(super) fn into_region(self, accelerate_uploading: bool) -> (Region, Duration) {
        let mut builder = Region::builder(self.region.unwrap_or_default());
        if accelerate_uploading {
            builder = push_v2_domains(
                builder,
                self.up.acc,
                RegionBuilder::add_up_preferred_endpoint,
                RegionBuilder::add_up_alternative_endpoint,
            );
        }
        builder = push_v2_domains(
            builder,
            self.up.src,
            RegionBuilder::add_up_preferred_endpoint,
            RegionBuilder::add_up_alternative_endpoint,
        );
        builder = push_v2_domains(
            builder,
            self.io.src,
            RegionBuilder::add_io_preferred_endpoint,
            RegionBuilder::add_io_alternative_endpoint,
        );
        builder = push_v2_domains(
            builder,
            self.uc.either(),
            RegionBuilder::add_uc_preferred_endpoint,
            RegionBuilder::add_uc_alternative_endpoint,
        );
        builder = push_v2_domains(
            builder,
            self.rs.either(),
            RegionBuilder::add_rs_preferred_endpoint,
            RegionBuilder::add_rs_alternative_endpoint,
        );
        builder = push_v2_domains(
            builder,
            self.rsf.either(),
            RegionBuilder::add_rsf_preferred_endpoint,
            RegionBuilder::add_rsf_alternative_endpoint,
        );
        builder = push_v2_domains(
            builder,
            self.api.either(),
            RegionBuilder::add_api_preferred_endpoint,
            RegionBuilder::add_api_alternative_endpoint,
        );
        (builder.build(), Duration::from_secs(self.ttl))
    }
}

impl V2ServiceBody {
    /// 管理类服务的域名可能出现在 `acc` 或 `src` 中
    fn either(self) -> V2DomainsBody {
        if self.acc.main.is_empty() {
            self.src
        } else {
            self.acc
        }
    }
}

fn push_v2_domains(
    mut builder: RegionBuilder,
    domains: V2DomainsBody,
    add_preferred: fn(RegionBuilder, String) -> RegionBuilder,
    add_alternative: fn(RegionBuilder, String) -> RegionBuilder,
) -> RegionBuilder {
    for domain in domains.main {
        builder = add_preferred(builder, domain);
    }
    for domain in domains.backup {
        builder = add_alternative(builder, domain);
    }
    builder
}
