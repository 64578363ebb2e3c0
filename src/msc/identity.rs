use crate::{
    config::Config,
    msc::error::{MscError, Result},
};

/// INQUIRY 数据中各字段的长度上限
pub const VENDOR_ID_LEN: usize = 8;
pub const PRODUCT_ID_LEN: usize = 16;
pub const PRODUCT_REVISION_LEN: usize = 4;

/// 注册时提交给主机的三个识别字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    vendor_id: String,
    product_id: String,
    product_revision: String,
}

impl Identity {
    pub fn new(vendor_id: &str, product_id: &str, product_revision: &str) -> Result<Self> {
        check("vendor id", vendor_id, VENDOR_ID_LEN)?;
        check("product id", product_id, PRODUCT_ID_LEN)?;
        check("product revision", product_revision, PRODUCT_REVISION_LEN)?;
        Ok(Self {
            vendor_id: vendor_id.to_string(),
            product_id: product_id.to_string(),
            product_revision: product_revision.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.vendor_id,
            &config.product_id,
            &config.product_revision,
        )
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn product_revision(&self) -> &str {
        &self.product_revision
    }
}

fn check(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(MscError::InvalidIdentity {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if !value.bytes().all(|b| (0x20..0x7f).contains(&b)) {
        return Err(MscError::InvalidIdentity {
            field,
            reason: format!("{:?} is not printable ASCII", value),
        });
    }
    if value.len() > max {
        return Err(MscError::InvalidIdentity {
            field,
            reason: format!("{:?} is longer than {} bytes", value, max),
        });
    }
    Ok(())
}
