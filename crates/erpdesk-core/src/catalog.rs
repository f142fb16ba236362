// ── Resource catalog ──
//
// Every list page the desk knows about, with its filters, columns,
// export schema and edit form.

use crate::form::{DerivedRule, FieldSpec, FormSpec, Rule, Submit};
use crate::pagination::PAGE_SIZE;
use crate::resource::{Column, ExportSpec, FilterSpec, OptionSource, Resource, SearchMode};

// ── Shared option sources ────────────────────────────────────────────

pub const ASSIGNED_USERS: OptionSource = OptionSource::Remote {
    path: "api/user/assigned-users/",
    value_key: "email",
    label_key: "email",
};

const DESIGNATIONS: OptionSource = OptionSource::Remote {
    path: "api/hr/designation/?type=list",
    value_key: "designation",
    label_key: "designation",
};

const DEPARTMENTS: OptionSource = OptionSource::Remote {
    path: "api/hr/department/",
    value_key: "department",
    label_key: "department",
};

const STAGES: OptionSource = OptionSource::Static(&["Screening", "Round1", "Round2"]);

const APPLICANT_STATUSES: OptionSource = OptionSource::Static(&[
    "Shortlisted",
    "Selected",
    "Schedule",
    "Reschedule",
    "Rejected",
]);

const VENDOR_TYPES: OptionSource = OptionSource::Static(&["Domestic", "International"]);

const fn all_of(path: &'static str) -> OptionSource {
    OptionSource::Remote {
        path,
        value_key: "id",
        label_key: "name",
    }
}

const PACKING_UNITS: OptionSource = all_of("api/product/packing-unit/?type=all");
const BRANDS: OptionSource = all_of("api/product/brand/?type=all");
const COLOURS: OptionSource = all_of("api/product/colour/?type=all");
const PRODUCT_CODES: OptionSource = OptionSource::Remote {
    path: "api/product/product-code/?type=all",
    value_key: "id",
    label_key: "code",
};
const UNITS: OptionSource = all_of("api/product/unit/?type=all");
const BASIC_UNITS: OptionSource = all_of("api/product/basic-unit/?type=all");

// ── Forms ────────────────────────────────────────────────────────────

pub const GST_MAX_LEN: usize = 15;
pub const GST_MESSAGE: &str = "GST NO should be less than or equal to 15 Digit";

pub static VENDOR_FORM: FormSpec = FormSpec {
    title: "Vendor",
    fields: &[
        FieldSpec::choice("type", "Type", VENDOR_TYPES),
        FieldSpec::text("name", "Name"),
        FieldSpec::text("address", "Address"),
        FieldSpec::text("pincode", "Pin Code"),
        FieldSpec::text("state", "State"),
        FieldSpec::text("city", "City"),
        FieldSpec::text("website", "Website"),
        FieldSpec::date("estd_date", "Established Date"),
        FieldSpec::text("gst_number", "GST Number"),
        FieldSpec::text("pan_number", "PAN Number"),
        FieldSpec::number("total_sales_turnover", "Total Sales Turnover"),
        FieldSpec::text("country", "Country"),
    ],
    rules: &[
        Rule::MaxLen {
            field: "gst_number",
            max: GST_MAX_LEN,
            message: GST_MESSAGE,
        },
        Rule::Required {
            field: "pan_number",
            message: "required",
        },
    ],
    derived: &[
        DerivedRule::PinWhen {
            trigger: "type",
            equals: "Domestic",
            target: "country",
            value: "India",
        },
        DerivedRule::ClearOnSwitch {
            trigger: "type",
            equals: "International",
            target: "country",
        },
    ],
    submit: Submit::Collection("api/inventory/vendor/"),
};

pub static BULK_ASSIGN_FORM: FormSpec = FormSpec {
    title: "Bulk Customer Assign",
    fields: &[
        FieldSpec::choice("assign_from", "Assign From", ASSIGNED_USERS),
        FieldSpec::choice("assign_to", "Assign To", ASSIGNED_USERS),
    ],
    rules: &[
        Rule::Required {
            field: "assign_from",
            message: "required",
        },
        Rule::Required {
            field: "assign_to",
            message: "required",
        },
        Rule::Distinct {
            first: "assign_from",
            second: "assign_to",
            message: "Assign From will not same as Assign To",
        },
    ],
    derived: &[],
    submit: Submit::Action("api/customer/bulk-assign/"),
};

static APPLICANT_FORM: FormSpec = FormSpec {
    title: "Applicant",
    fields: &[
        FieldSpec::text("name", "Candidate Name"),
        FieldSpec::text("email", "Email"),
        FieldSpec::text("contact", "Phone Number"),
        FieldSpec::text("job", "Job ID"),
        FieldSpec::choice("designation", "Designation", DESIGNATIONS),
        FieldSpec::choice("department", "Department", DEPARTMENTS),
        FieldSpec::choice("stage", "Stage", STAGES),
        FieldSpec::choice("status", "Status", APPLICANT_STATUSES),
        FieldSpec::text("source", "Source"),
    ],
    rules: &[
        Rule::Required {
            field: "name",
            message: "required",
        },
        Rule::Required {
            field: "email",
            message: "required",
        },
    ],
    derived: &[],
    submit: Submit::Collection("api/hr/applicant/"),
};

static FINISHED_GOOD_FORM: FormSpec = FormSpec {
    title: "Finished Good",
    fields: &[
        FieldSpec::choice("description", "Description", all_of("api/product/description/?type=all")),
        FieldSpec::choice("brand", "Brand", BRANDS),
        FieldSpec::choice("colour", "Colour", COLOURS),
        FieldSpec::choice("product_code", "Product Code", PRODUCT_CODES),
        FieldSpec::choice("unit", "Unit", UNITS),
        FieldSpec::choice("basic_unit", "Basic Unit", BASIC_UNITS),
        FieldSpec::choice("packing_unit", "Packing Unit", PACKING_UNITS),
        FieldSpec::text("hsn_code", "HSN Code"),
        FieldSpec::number("gst", "GST%"),
    ],
    rules: &[
        Rule::Required {
            field: "description",
            message: "required",
        },
        Rule::Required {
            field: "unit",
            message: "required",
        },
    ],
    derived: &[],
    submit: Submit::Collection("api/product/finished-goods/"),
};

static COLOUR_FORM: FormSpec = FormSpec {
    title: "Colour",
    fields: &[FieldSpec::text("name", "Colour")],
    rules: &[Rule::Required {
        field: "name",
        message: "required",
    }],
    derived: &[],
    submit: Submit::Collection("api/product/colour/"),
};

static DESCRIPTION_FORM: FormSpec = FormSpec {
    title: "Description",
    fields: &[
        FieldSpec::text("name", "Description"),
        FieldSpec::text("consumable", "Consumable"),
    ],
    rules: &[Rule::Required {
        field: "name",
        message: "required",
    }],
    derived: &[],
    submit: Submit::Collection("api/product/description/"),
};

// ── Company tabs ─────────────────────────────────────────────────────

pub static COMPANY_FORM: FormSpec = FormSpec {
    title: "Company",
    fields: &[
        FieldSpec::text("name", "Company Name"),
        FieldSpec::text("address", "Address"),
        FieldSpec::text("pincode", "Pin Code"),
        FieldSpec::text("state", "State"),
        FieldSpec::text("city", "City"),
        FieldSpec::text("website", "Website"),
        FieldSpec::choice("assigned_to", "Assigned To", ASSIGNED_USERS),
    ],
    rules: &[Rule::Required {
        field: "name",
        message: "required",
    }],
    derived: &[],
    submit: Submit::Collection("api/customer/company/"),
};

pub static BANK_FORM: FormSpec = FormSpec {
    title: "Bank",
    fields: &[
        FieldSpec::text("bank_name", "Bank Name"),
        FieldSpec::text("current_account_no", "Account No"),
        FieldSpec::text("ifsc_code", "IFSC Code"),
        FieldSpec::text("branch", "Branch"),
    ],
    rules: &[Rule::Required {
        field: "current_account_no",
        message: "required",
    }],
    derived: &[],
    submit: Submit::Collection("api/customer/company/"),
};

pub static CONTACT_FORM: FormSpec = FormSpec {
    title: "Contact",
    fields: &[
        FieldSpec::text("name", "Name"),
        FieldSpec::text("designation", "Designation"),
        FieldSpec::text("email", "Email"),
        FieldSpec::text("contact", "Contact"),
        FieldSpec::text("alternate_contact", "Alternate Contact"),
    ],
    rules: &[Rule::Required {
        field: "contact",
        message: "required",
    }],
    derived: &[],
    submit: Submit::Collection("api/customer/company/"),
};

pub static WAREHOUSE_FORM: FormSpec = FormSpec {
    title: "WareHouse",
    fields: &[
        FieldSpec::text("address", "Address"),
        FieldSpec::text("pincode", "Pin Code"),
        FieldSpec::text("state", "State"),
        FieldSpec::text("city", "City"),
    ],
    rules: &[Rule::Required {
        field: "address",
        message: "required",
    }],
    derived: &[],
    submit: Submit::Collection("api/customer/company/"),
};

pub static SECURITY_CHEQUE_FORM: FormSpec = FormSpec {
    title: "Security Cheques",
    fields: &[
        FieldSpec::text("cheque_no", "Cheque No"),
        FieldSpec::text("bank_name", "Bank Name"),
        FieldSpec::number("amount", "Amount"),
        FieldSpec::date("cheque_date", "Cheque Date"),
    ],
    rules: &[],
    derived: &[],
    submit: Submit::Collection("api/customer/company/"),
};

pub static FORECAST_FORM: FormSpec = FormSpec {
    title: "Forecast",
    fields: &[
        FieldSpec::text("product", "Product"),
        FieldSpec::number("month", "Month"),
        FieldSpec::number("year", "Year"),
        FieldSpec::number("forecast", "Forecast Quantity"),
    ],
    rules: &[],
    derived: &[],
    submit: Submit::Collection("api/customer/company/"),
};

pub static KYC_FORM: FormSpec = FormSpec {
    title: "KYC",
    fields: &[
        FieldSpec::text("gst_number", "GST Number"),
        FieldSpec::text("pan_number", "PAN Number"),
        FieldSpec::text("cin_number", "CIN Number"),
    ],
    rules: &[Rule::MaxLen {
        field: "gst_number",
        max: GST_MAX_LEN,
        message: GST_MESSAGE,
    }],
    derived: &[],
    submit: Submit::Collection("api/customer/company/"),
};

// ── Resources ────────────────────────────────────────────────────────

pub static APPLICANTS: Resource = Resource {
    key: "applicants",
    title: "Applicants",
    endpoint: "api/hr/applicant/",
    page_size: Some(PAGE_SIZE),
    search: SearchMode::LocalPage {
        fields: &["name", "email", "job"],
    },
    filters: &[
        FilterSpec {
            key: "designations",
            label: "Designation",
            source: DESIGNATIONS,
        },
        FilterSpec {
            key: "department",
            label: "Department",
            source: DEPARTMENTS,
        },
        FilterSpec {
            key: "stage",
            label: "Stage",
            source: STAGES,
        },
        FilterSpec {
            key: "status",
            label: "Status",
            source: APPLICANT_STATUSES,
        },
    ],
    columns: &[
        Column { header: "Job ID", key: "job" },
        Column { header: "Candidate Name", key: "name" },
        Column { header: "Phone Number", key: "contact" },
        Column { header: "Email", key: "email" },
        Column { header: "Designation", key: "designation" },
        Column { header: "Department", key: "department" },
        Column { header: "Stage", key: "stage" },
        Column { header: "Status", key: "status" },
        Column { header: "Source", key: "source" },
    ],
    export: None,
    form: Some(&APPLICANT_FORM),
    side_lists: &[],
};

pub static FINISHED_GOODS: Resource = Resource {
    key: "finished-goods",
    title: "Finished Goods",
    endpoint: "api/product/finished-goods/",
    page_size: Some(PAGE_SIZE),
    search: SearchMode::Server,
    filters: &[],
    columns: &[
        Column { header: "ID", key: "id" },
        Column { header: "FINISH GOODS", key: "name" },
        Column { header: "UNIT", key: "unit" },
        Column { header: "BRAND", key: "brand" },
        Column { header: "PRODUCT CODE", key: "productcode" },
        Column { header: "DESCRIPTION", key: "description" },
        Column { header: "HSN CODE", key: "hsn_code" },
        Column { header: "GST%", key: "gst" },
    ],
    export: None,
    form: Some(&FINISHED_GOOD_FORM),
    side_lists: &[
        ("packing_units", PACKING_UNITS),
        ("brands", BRANDS),
        ("colours", COLOURS),
        ("product_codes", PRODUCT_CODES),
        ("units", UNITS),
        ("basic_units", BASIC_UNITS),
    ],
};

pub static RAW_MATERIALS: Resource = Resource {
    key: "raw-materials",
    title: "Raw Materials",
    endpoint: "api/product/raw-materials/",
    page_size: Some(PAGE_SIZE),
    search: SearchMode::Server,
    filters: &[],
    columns: &[
        Column { header: "ID", key: "id" },
        Column { header: "RAW MATERIAL", key: "name" },
        Column { header: "UNIT", key: "unit" },
        Column { header: "BRAND", key: "brand" },
        Column { header: "PRODUCT CODE", key: "productcode" },
        Column { header: "DESCRIPTION", key: "description" },
        Column { header: "HSN CODE", key: "hsn_code" },
        Column { header: "GST%", key: "gst" },
    ],
    export: None,
    form: None,
    side_lists: &[],
};

pub static COLOURS_LIST: Resource = Resource {
    key: "colours",
    title: "Colours",
    endpoint: "api/product/colour/",
    page_size: None,
    search: SearchMode::Server,
    filters: &[],
    columns: &[
        Column { header: "ID", key: "id" },
        Column { header: "COLOUR", key: "name" },
    ],
    export: None,
    form: Some(&COLOUR_FORM),
    side_lists: &[],
};

pub static DESCRIPTIONS: Resource = Resource {
    key: "descriptions",
    title: "Descriptions",
    endpoint: "api/product/description/",
    page_size: None,
    search: SearchMode::Server,
    filters: &[],
    columns: &[
        Column { header: "ID", key: "id" },
        Column { header: "DESCRIPTION", key: "name" },
        Column { header: "CONSUMABLE", key: "consumable" },
    ],
    export: None,
    form: Some(&DESCRIPTION_FORM),
    side_lists: &[],
};

const MRF_COLUMNS: &[Column] = &[
    Column { header: "ID", key: "id" },
    Column { header: "DATE", key: "date" },
    Column { header: "PRODUCT", key: "product" },
    Column { header: "UNIT", key: "unit" },
    Column { header: "QUANTITY", key: "quantity" },
    Column { header: "BRANCH", key: "branch" },
];

static MRF_EXPORT: ExportSpec = ExportSpec {
    columns: MRF_COLUMNS,
    file_stem: "MRF Products",
};

pub static MRF_PRODUCTS: Resource = Resource {
    key: "mrf-products",
    title: "MRF Products",
    endpoint: "api/inventory/mrf-products/",
    page_size: None,
    search: SearchMode::Disabled,
    filters: &[FilterSpec {
        key: "filter_by",
        label: "Filter By Days",
        source: OptionSource::Static(&["today", "yesterday", "this_month"]),
    }],
    columns: MRF_COLUMNS,
    export: Some(&MRF_EXPORT),
    form: None,
    side_lists: &[],
};

pub static VENDORS: Resource = Resource {
    key: "vendors",
    title: "Vendors",
    endpoint: "api/inventory/vendor/",
    page_size: Some(PAGE_SIZE),
    search: SearchMode::Server,
    filters: &[],
    columns: &[
        Column { header: "ID", key: "id" },
        Column { header: "TYPE", key: "type" },
        Column { header: "NAME", key: "name" },
        Column { header: "GST NO", key: "gst_number" },
        Column { header: "PAN NO", key: "pan_number" },
        Column { header: "CITY", key: "city" },
        Column { header: "STATE", key: "state" },
        Column { header: "COUNTRY", key: "country" },
    ],
    export: None,
    form: Some(&VENDOR_FORM),
    side_lists: &[],
};

pub static COMPANIES: Resource = Resource {
    key: "companies",
    title: "Companies",
    endpoint: "api/customer/company/",
    page_size: Some(PAGE_SIZE),
    search: SearchMode::Server,
    filters: &[FilterSpec {
        key: "assigned_to",
        label: "Assigned To",
        source: ASSIGNED_USERS,
    }],
    columns: &[
        Column { header: "ID", key: "id" },
        Column { header: "NAME", key: "name" },
        Column { header: "GST NO", key: "gst_number" },
        Column { header: "PAN NO", key: "pan_number" },
        Column { header: "CITY", key: "city" },
        Column { header: "STATE", key: "state" },
        Column { header: "ASSIGNED TO", key: "assigned_to" },
    ],
    export: None,
    form: Some(&COMPANY_FORM),
    side_lists: &[],
};

/// Every resource, in menu order.
pub static ALL: &[&Resource] = &[
    &APPLICANTS,
    &COMPANIES,
    &VENDORS,
    &FINISHED_GOODS,
    &RAW_MATERIALS,
    &COLOURS_LIST,
    &DESCRIPTIONS,
    &MRF_PRODUCTS,
];

pub fn find(key: &str) -> Option<&'static Resource> {
    ALL.iter().copied().find(|r| r.key == key)
}

pub fn keys() -> impl Iterator<Item = &'static str> {
    ALL.iter().map(|r| r.key)
}
