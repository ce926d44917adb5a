//! Module definitions
//!
//! A module is a named group of token-authenticated POST endpoints. Each
//! definition maps a method name, spelled the way WeChat's documentation
//! spells it, to the endpoint path. The built-in table below is loaded once
//! per client; extra modules are registered on the builder before
//! construction and are read-only afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type StaticModule = (&'static str, &'static [(&'static str, &'static str)]);

const BUILTIN_MODULES: &[StaticModule] = &[
    (
        "analysis",
        &[
            ("getDailyRetain", "/datacube/getweanalysisappiddailyretaininfo"),
            ("getMonthlyRetain", "/datacube/getweanalysisappidmonthlyretaininfo"),
            ("getWeeklyRetain", "/datacube/getweanalysisappidweeklyretaininfo"),
            ("getDailySummary", "/datacube/getweanalysisappiddailysummarytrend"),
            ("getDailyVisitTrend", "/datacube/getweanalysisappiddailyvisittrend"),
            ("getMonthlyVisitTrend", "/datacube/getweanalysisappidmonthlyvisittrend"),
            ("getWeeklyVisitTrend", "/datacube/getweanalysisappidweeklyvisittrend"),
            ("getUserPortrait", "/datacube/getweanalysisappiduserportrait"),
            ("getVisitDistribution", "/datacube/getweanalysisappidvisitdistribution"),
            ("getVisitPage", "/datacube/getweanalysisappidvisitpage"),
            ("getPerformanceData", "/wxa/business/performance/boot"),
        ],
    ),
    (
        "cloudbase",
        &[
            ("invokeCloudFunction", "/tcb/invokecloudfunction"),
            ("addDelayedFunctionTask", "/tcb/adddelayedfunctiontask"),
            ("databaseAdd", "/tcb/databaseadd"),
            ("databaseDelete", "/tcb/databasedelete"),
            ("databaseQuery", "/tcb/databasequery"),
            ("databaseUpdate", "/tcb/databaseupdate"),
            ("uploadFile", "/tcb/uploadfile"),
            ("batchDownloadFile", "/tcb/batchdownloadfile"),
            ("batchDeleteFile", "/tcb/batchdeletefile"),
            ("sendSms", "/tcb/sendsms_v2"),
        ],
    ),
    (
        "customerservicemessage",
        &[
            ("send", "/cgi-bin/message/custom/send"),
            ("setTyping", "/cgi-bin/message/custom/typing"),
        ],
    ),
    (
        "img",
        &[
            ("aiCrop", "/cv/img/aicrop"),
            ("scanQRCode", "/cv/img/qrcode"),
            ("superresolution", "/cv/img/superresolution"),
        ],
    ),
    (
        "logistics",
        &[
            ("addOrder", "/cgi-bin/express/business/order/add"),
            ("cancelOrder", "/cgi-bin/express/business/order/cancel"),
            ("getOrder", "/cgi-bin/express/business/order/get"),
            ("getPath", "/cgi-bin/express/business/path/get"),
            ("bindAccount", "/cgi-bin/express/business/account/bind"),
        ],
    ),
    (
        "nearbypoi",
        &[
            ("add", "/wxa/addnearbypoi"),
            ("delete", "/wxa/delnearbypoi"),
            ("getList", "/wxa/getnearbypoilist"),
            ("setShowStatus", "/wxa/setnearbypoishowstatus"),
        ],
    ),
    (
        "ocr",
        &[
            ("bankcard", "/cv/ocr/bankcard"),
            ("businessLicense", "/cv/ocr/bizlicense"),
            ("driverLicense", "/cv/ocr/drivinglicense"),
            ("idcard", "/cv/ocr/idcard"),
            ("printedText", "/cv/ocr/comm"),
            ("vehicleLicense", "/cv/ocr/driving"),
        ],
    ),
    (
        "operation",
        &[
            ("getDomainInfo", "/wxa/get_wxa_domain"),
            ("getJsErrDetail", "/wxaapi/log/jserr_detail"),
            ("getJsErrList", "/wxaapi/log/jserr_list"),
            ("getPerformance", "/wxaapi/log/get_performance"),
        ],
    ),
    ("phonenumber", &[("getPhoneNumber", "/wxa/business/getuserphonenumber")]),
    (
        "pluginmanager",
        &[
            ("applyPlugin", "/wxa/plugin"),
            ("getPluginList", "/wxa/plugin"),
            ("unbindPlugin", "/wxa/plugin"),
            ("getPluginDevApplyList", "/wxa/devplugin"),
            ("setDevPluginApplyStatus", "/wxa/devplugin"),
        ],
    ),
    ("search", &[("submitPages", "/wxa/search/wxaapi_submitpages")]),
    (
        "security",
        &[
            ("imgSecCheck", "/wxa/img_sec_check"),
            ("mediaCheckAsync", "/wxa/media_check_async"),
            ("msgSecCheck", "/wxa/msg_sec_check"),
            ("getUserRiskRank", "/wxa/getuserriskrank"),
        ],
    ),
    ("servicemarket", &[("invokeService", "/wxa/servicemarket")]),
    ("shortlink", &[("generate", "/wxa/genwxashortlink")]),
    ("soter", &[("verifySignature", "/cgi-bin/soter/verify_signature")]),
    (
        "subscribemessage",
        &[
            ("addTemplate", "/wxaapi/newtmpl/addtemplate"),
            ("deleteTemplate", "/wxaapi/newtmpl/deltemplate"),
            ("getCategory", "/wxaapi/newtmpl/getcategory"),
            ("getPubTemplateKeyWordsById", "/wxaapi/newtmpl/getpubtemplatekeywords"),
            ("getPubTemplateTitleList", "/wxaapi/newtmpl/getpubtemplatetitles"),
            ("getTemplateList", "/wxaapi/newtmpl/gettemplate"),
            ("send", "/cgi-bin/message/subscribe/send"),
        ],
    ),
    (
        "updatablemessage",
        &[
            ("createActivityId", "/cgi-bin/message/wxopen/activityid/create"),
            ("setUpdatableMsg", "/cgi-bin/message/wxopen/updatablemsg/send"),
        ],
    ),
    (
        "urllink",
        &[
            ("generate", "/wxa/generate_urllink"),
            ("query", "/wxa/query_urllink"),
        ],
    ),
    (
        "urlscheme",
        &[
            ("generate", "/wxa/generatescheme"),
            ("query", "/wxa/queryscheme"),
        ],
    ),
    (
        "wxacode",
        &[
            ("createQRCode", "/cgi-bin/wxaapp/createwxaqrcode"),
            ("get", "/wxa/getwxacode"),
            ("getUnlimited", "/wxa/getwxacodeunlimit"),
        ],
    ),
];

/// One module: its (lower-case) name and method name → endpoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDefinition {
    name: String,
    methods: BTreeMap<String, String>,
}

impl ModuleDefinition {
    /// The name is stored lower-cased, matching how lookups normalize it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            methods: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a method. `path` is relative to the API host
    /// unless it is an absolute http(s) URL.
    pub fn method(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.methods.insert(name.into(), path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self, method: &str) -> Option<&str> {
        self.methods.get(method).map(String::as_str)
    }

    pub fn methods(&self) -> impl Iterator<Item = (&str, &str)> {
        self.methods.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// The set of modules a client can dispatch to.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<ModuleDefinition>>,
}

impl ModuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with the modules this crate ships with.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, methods) in BUILTIN_MODULES {
            let definition = methods
                .iter()
                .fold(ModuleDefinition::new(*name), |def, (method, path)| {
                    def.method(*method, *path)
                });
            registry.register(definition);
        }
        registry
    }

    /// Adds a module, replacing any previous definition with the same name.
    pub fn register(&mut self, definition: ModuleDefinition) {
        self.modules
            .insert(definition.name.clone(), Arc::new(definition));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ModuleDefinition>> {
        self.modules.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Module names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
