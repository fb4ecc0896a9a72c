//! CredentialCreate, CredentialAccept and CredentialDelete.

use tally_ledger::credentials::{self, CredentialLookup};
use tally_ledger::objects::{Credential, LedgerObject};
use tally_ledger::{keylet, reserve, ReadView, Sandbox};
use tally_types::limits::MAX_CREDENTIAL_URI_LEN;
use tally_types::{AccountId, TxError, TxResult};
use tracing::debug;

use super::{check_account_field, check_credential_type};
use crate::transactor::{account_root, ApplyContext, Transactor};
use crate::tx::{CredentialAccept, CredentialCreate, CredentialDelete};

impl Transactor for CredentialCreate {
    fn preflight(&self, _account: &AccountId) -> TxResult {
        check_credential_type(&self.credential_type)?;
        if let Some(uri) = &self.uri {
            if uri.is_empty() || uri.len() > MAX_CREDENTIAL_URI_LEN {
                return Err(TxError::malformed(format!("uri of {} bytes", uri.len())));
            }
        }
        if self.subject.is_zero() {
            return Err(TxError::malformed("subject is the zero account"));
        }
        Ok(())
    }

    fn preclaim(&self, ctx: &ApplyContext<'_>, view: &dyn ReadView) -> TxResult {
        if !view.account_exists(&self.subject) {
            return Err(TxError::NoTarget);
        }
        let key = keylet::credential(&self.subject, &ctx.account, &self.credential_type);
        if view.exists(&key.index) {
            return Err(TxError::Duplicate);
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        if self
            .expiration
            .is_some_and(|exp| !exp.is_after(ctx.close_time))
        {
            return Err(TxError::Expired);
        }

        let credential = Credential {
            subject: self.subject,
            issuer: ctx.account,
            credential_type: self.credential_type.clone(),
            uri: self.uri.clone(),
            expiration: self.expiration,
            accepted: self.subject == ctx.account,
        };
        let key = keylet::credential(&self.subject, &ctx.account, &self.credential_type);
        reserve::try_add_object(
            view,
            key.index,
            LedgerObject::Credential(credential),
            ctx.prior_balance,
        )
    }
}

impl Transactor for CredentialAccept {
    fn preflight(&self, _account: &AccountId) -> TxResult {
        check_account_field(&self.issuer)?;
        check_credential_type(&self.credential_type)
    }

    fn preclaim(&self, ctx: &ApplyContext<'_>, view: &dyn ReadView) -> TxResult {
        if !view.account_exists(&self.issuer) {
            return Err(TxError::NoIssuer);
        }
        let key = keylet::credential(&ctx.account, &self.issuer, &self.credential_type);
        match view.credential(&key.index) {
            None => Err(TxError::NoEntry),
            Some(c) if c.accepted => Err(TxError::Duplicate),
            Some(_) => Ok(()),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        let key = keylet::credential(&ctx.account, &self.issuer, &self.credential_type);
        let mut credential = match credentials::resolve(&*view, &key.index, ctx.close_time) {
            CredentialLookup::Live(c) => c,
            CredentialLookup::Expired(_) => {
                ctx.expired.push(key.index);
                return Err(TxError::Expired);
            }
            CredentialLookup::Missing => return Err(TxError::NoEntry),
        };

        let subject = account_root(&*view, &ctx.account)?;
        reserve::check_reserve(
            view.reserves(),
            ctx.prior_balance,
            subject.owner_count.saturating_add(1),
        )?;

        credential.accepted = true;
        reserve::replace_object(view, key.index, LedgerObject::Credential(credential))?;
        debug!(index = %key.index.short_hex(), subject = %ctx.account, "credential accepted");
        Ok(())
    }
}

impl Transactor for CredentialDelete {
    fn preflight(&self, _account: &AccountId) -> TxResult {
        if self.subject.is_none() && self.issuer.is_none() {
            return Err(TxError::malformed("neither subject nor issuer given"));
        }
        if self.subject.is_some_and(|id| id.is_zero()) || self.issuer.is_some_and(|id| id.is_zero())
        {
            return Err(TxError::malformed("zero account in subject or issuer"));
        }
        check_credential_type(&self.credential_type)
    }

    fn preclaim(&self, ctx: &ApplyContext<'_>, view: &dyn ReadView) -> TxResult {
        let (subject, issuer) = self.parties(&ctx.account);
        let key = keylet::credential(&subject, &issuer, &self.credential_type);
        let credential = view.credential(&key.index).ok_or(TxError::NoEntry)?;
        let is_party = ctx.account == subject || ctx.account == issuer;
        if !is_party && !credential.is_expired(ctx.close_time) {
            return Err(TxError::NoPermission);
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, view: &mut Sandbox<'_>) -> TxResult {
        let (subject, issuer) = self.parties(&ctx.account);
        let key = keylet::credential(&subject, &issuer, &self.credential_type);
        credentials::delete(view, &key.index)
    }
}

impl CredentialDelete {
    fn parties(&self, submitter: &AccountId) -> (AccountId, AccountId) {
        (
            self.subject.unwrap_or(*submitter),
            self.issuer.unwrap_or(*submitter),
        )
    }
}
