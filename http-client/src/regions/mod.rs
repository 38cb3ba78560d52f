mod cache_key;
mod endpoints;
mod region;
mod region_group;
mod regions_cache;
mod resolver;
mod structs;

pub use cache_key::CacheKey;
pub use endpoints::{Endpoints, EndpointsBuilder, InvalidServiceName, ServiceName};
pub use region::{Region, RegionBuilder};
pub use region_group::RegionGroup;
pub use regions_cache::{RegionsCache, RegionsCacheBuilder};
pub use resolver::{QueryVersion, RegionResolver, RegionResolverBuilder};
